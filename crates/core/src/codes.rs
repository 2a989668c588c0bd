//! Human-typed code generation.
//!
//! Pickup codes and coupon codes are read off a screen and typed on a phone, so
//! they are drawn from an alphabet without look-alike characters (`0`/`O`,
//! `1`/`I`).

use rand::{Rng, seq::SliceRandom};

/// Characters used for generated codes.
pub const UNAMBIGUOUS_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generate `len` random characters from [`UNAMBIGUOUS_ALPHABET`].
pub fn random_segment<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .filter_map(|_| UNAMBIGUOUS_ALPHABET.choose(rng).copied().map(char::from))
        .collect()
}

/// Whether `c` may appear in a generated code.
#[must_use]
pub fn is_unambiguous(c: char) -> bool {
    u8::try_from(c).is_ok_and(|byte| UNAMBIGUOUS_ALPHABET.contains(&byte))
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn segments_have_requested_length() {
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(random_segment(&mut rng, 6).len(), 6);
        assert_eq!(random_segment(&mut rng, 0).len(), 0);
    }

    #[test]
    fn segments_avoid_look_alike_characters() {
        let mut rng = StdRng::seed_from_u64(42);
        let sample: String = (0..64).map(|_| random_segment(&mut rng, 8)).collect();

        assert!(sample.chars().all(is_unambiguous), "got {sample}");
        assert!(!sample.contains(['0', 'O', '1', 'I']), "got {sample}");
    }
}
