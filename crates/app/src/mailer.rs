//! HTTP receipt mailer.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;
use vendpass::email::{EmailAddress, EmailError, ReceiptEmail, ReceiptMailer};

/// Posts receipt e-mails as JSON to a delivery endpoint.
#[derive(Debug, Clone)]
pub struct HttpReceiptMailer {
    endpoint: String,
    http: Client,
}

/// Body of the delivery request: the recipient next to the template fields.
#[derive(Debug, Serialize)]
struct Delivery<'a> {
    to: &'a EmailAddress,
    #[serde(flatten)]
    email: &'a ReceiptEmail,
}

impl HttpReceiptMailer {
    /// Create a mailer posting to `endpoint`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: Client::new(),
        }
    }

    /// The delivery endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReceiptMailer for HttpReceiptMailer {
    async fn send(
        &self,
        recipient: &EmailAddress,
        email: &ReceiptEmail,
    ) -> Result<(), EmailError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&Delivery {
                to: recipient,
                email,
            })
            .send()
            .await
            .map_err(|error| EmailError::Delivery(Box::new(error)))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            return Err(EmailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(transaction = %email.transaction_id, "receipt e-mailed");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn delivery_flattens_the_template_fields() -> TestResult {
        let to: EmailAddress = "shopper@example.com".parse()?;
        let email = ReceiptEmail {
            transaction_id: "pay_1".to_string(),
            date: "2023-11-14T22:13:20Z".to_string(),
            total_amount: "₹40.00".to_string(),
            items: "Chips x2".to_string(),
            coupon_code: Some("VND-AB12-CD34".to_string()),
        };

        let body = serde_json::to_value(Delivery {
            to: &to,
            email: &email,
        })?;

        assert_eq!(
            body,
            json!({
                "to": "shopper@example.com",
                "transaction_id": "pay_1",
                "date": "2023-11-14T22:13:20Z",
                "total_amount": "₹40.00",
                "items": "Chips x2",
                "coupon_code": "VND-AB12-CD34"
            })
        );

        Ok(())
    }
}
