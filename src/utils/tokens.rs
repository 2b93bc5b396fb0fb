use rand::{Rng, distributions::Alphanumeric};

use classconnect_models::classes::{CLASS_CODE_ALPHABET, CLASS_CODE_LENGTH};

pub const RESET_TOKEN_LENGTH: usize = 32;

/// Opaque single-use token for password reset and email verification.
pub fn generate_reset_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Six characters from `A-Z0-9`.
pub fn generate_class_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CLASS_CODE_LENGTH)
        .map(|_| CLASS_CODE_ALPHABET[rng.gen_range(0..CLASS_CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_token_shape() {
        let token = generate_reset_token();
        assert_eq!(token.len(), RESET_TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_reset_token());
    }

    #[test]
    fn test_class_code_shape() {
        for _ in 0..50 {
            let code = generate_class_code();
            assert_eq!(code.len(), CLASS_CODE_LENGTH);
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            );
        }
    }
}
