//! Password strength checks and bcrypt hashing for the admin password.

use std::fmt::Display;

use bcrypt::{BcryptError, hash, verify};
use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// A password that passed the strength check but has not been hashed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check the strength of `raw_password` with zxcvbn.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] with zxcvbn's feedback if the password scores
    /// lower than three.
    pub fn new(raw_password: &str) -> Result<Self, Error> {
        let analysis = zxcvbn(raw_password, &[]);

        match analysis.score() {
            Score::Three | Score::Four => Ok(Self(raw_password.to_owned())),
            _ => Err(Error::TooWeak(
                analysis
                    .feedback()
                    .unwrap_or(&Feedback::default())
                    .to_string(),
            )),
        }
    }

    /// Wrap `raw_password` without checking its strength. Intended for tests.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

/// A salted bcrypt hash of a password.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The bcrypt cost used outside of tests.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with the given bcrypt `cost`.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if bcrypt fails, e.g. on an invalid cost.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash read back from the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Check the strength of `raw_password` and hash it.
    pub fn from_raw_password(raw_password: &str, cost: u32) -> Result<Self, Error> {
        let validated_password = ValidatedPassword::new(raw_password)?;
        PasswordHash::new(validated_password, cost)
    }

    /// Check that `raw_password` matches the stored hash.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        verify(raw_password, &self.0)
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::{PasswordHash, ValidatedPassword};

    #[test]
    fn rejects_weak_passwords() {
        assert!(matches!(ValidatedPassword::new(""), Err(Error::TooWeak(_))));
        assert!(matches!(
            ValidatedPassword::new("society123"),
            Err(Error::TooWeak(_))
        ));
    }

    #[test]
    fn accepts_long_password() {
        assert!(ValidatedPassword::new("gulmohar-terrace-water-tank-42").is_ok());
    }

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hash = PasswordHash::from_raw_password("gulmohar-terrace-water-tank-42", 4).unwrap();

        assert!(hash.verify("gulmohar-terrace-water-tank-42").unwrap());
        assert!(!hash.verify("admin").unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        let password = ValidatedPassword::new_unchecked("admin");

        let first = PasswordHash::new(password.clone(), 4).unwrap();
        let second = PasswordHash::new(password, 4).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn display_hides_password() {
        let password = ValidatedPassword::new_unchecked("admin");

        assert_eq!(password.to_string(), "********");
    }
}
