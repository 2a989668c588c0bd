use vendpass::sessions::{SessionReuse, SessionsService};

use crate::cli::{Context, output};

pub(crate) async fn run(context: &Context) -> Result<(), String> {
    let sessions = context
        .sessions()
        .active_sessions()
        .await
        .map_err(|error| format!("failed to list sessions: {error}"))?;

    if sessions.is_empty() {
        println!("no active sessions");
        return Ok(());
    }

    let now = context.clock.now();

    let rows = sessions
        .iter()
        .map(|session| {
            [
                session
                    .code
                    .as_ref()
                    .map_or_else(String::new, ToString::to_string),
                session.machine_id.to_string(),
                output::remaining(now, session.expires_at()),
                match session.reuse() {
                    SessionReuse::SingleUse => "single use".to_string(),
                    SessionReuse::Reusable => {
                        format!("reusable ({} uses)", session.usage_count.unwrap_or(0))
                    }
                },
                if session.is_logged_in { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();

    output::print_table(["Code", "Machine", "Time left", "Reuse", "Logged in"], rows);

    Ok(())
}
