use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::{ClientError, ClientResult};

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn hash_password(password: &str) -> ClientResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|error| ClientError::internal_credentials(&error.to_string()))?;
    Ok(hash.to_string())
}

/// False for a wrong password and for an unparseable stored hash alike.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn check_new_password(password: &str, command: &str) -> ClientResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ClientError::invalid_argument_for_command(
            &format!("New password must be at least {MIN_PASSWORD_LEN} characters long."),
            Some(command),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check_new_password, hash_password, verify_password};

    #[test]
    fn hash_round_trips_through_verify() {
        let hashed = hash_password("pass123");
        assert!(hashed.is_ok());
        if let Ok(hash) = hashed {
            assert!(hash.starts_with("$argon2"));
            assert!(verify_password("pass123", &hash));
            assert!(!verify_password("pass124", &hash));
        }
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("pass123", "not-a-hash"));
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(check_new_password("12345", "member password").is_err());
        assert!(check_new_password("123456", "member password").is_ok());
    }
}
