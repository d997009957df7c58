//! One-time code generation and hashing.

use core::fmt;

use argon2::{
    Argon2, Params,
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;
use serde::{Deserialize, Deserializer};

use super::VerificationError;

/// Number of digits in a verification code.
pub const CODE_LENGTH: usize = 6;

/// Returned when submitted text is not a well-formed code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("verification code must be exactly {CODE_LENGTH} digits")]
pub struct CodeFormatError;

/// A six-digit one-time code, kept as text so leading zeros survive.
///
/// `Debug` is redacted; the only way to read the digits is [`Self::as_str`].
#[derive(Clone, PartialEq, Eq)]
pub struct OneTimeCode(String);

impl OneTimeCode {
    /// Draw six independent uniform digits from the thread-local CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let digits = (0..CODE_LENGTH)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect();
        Self(digits)
    }

    /// Validate submitted text.
    ///
    /// # Errors
    ///
    /// Returns `CodeFormatError` unless the input is exactly six ASCII digits.
    pub fn parse(s: &str) -> Result<Self, CodeFormatError> {
        if s.len() == CODE_LENGTH && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_owned()))
        } else {
            Err(CodeFormatError)
        }
    }

    /// The plaintext digits. Only the mail channel and the hasher should call this.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OneTimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OneTimeCode(******)")
    }
}

impl<'de> Deserialize<'de> for OneTimeCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Argon2id hashing for stored codes.
///
/// Comparison goes through the algorithm's own verifier, which compares the
/// derived output in constant time.
#[derive(Clone)]
pub struct CodeHasher {
    argon2: Argon2<'static>,
}

impl fmt::Debug for CodeHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeHasher").finish_non_exhaustive()
    }
}

impl Default for CodeHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl CodeHasher {
    /// Hasher with explicit cost parameters.
    #[must_use]
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
        }
    }

    /// Hash a code with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns `VerificationError::CodeHash` if hashing fails.
    pub fn hash(&self, code: &OneTimeCode) -> Result<String, VerificationError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(code.as_str().as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| VerificationError::CodeHash)
    }

    /// Check a submitted code against a stored hash.
    ///
    /// # Errors
    ///
    /// Returns `VerificationError::CodeHash` if the stored hash is unreadable.
    /// A mismatch is `Ok(false)`, not an error.
    pub fn matches(&self, code: &OneTimeCode, stored_hash: &str) -> Result<bool, VerificationError> {
        let parsed = PasswordHash::new(stored_hash).map_err(|_| VerificationError::CodeHash)?;
        match self.argon2.verify_password(code.as_str().as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(_) => Err(VerificationError::CodeHash),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Cheap parameters so tests don't spend seconds per hash.
    pub(crate) fn fast_hasher() -> CodeHasher {
        CodeHasher::with_params(Params::new(256, 1, 1, None).unwrap())
    }

    #[test]
    fn test_generated_code_shape() {
        for _ in 0..1_000 {
            let code = OneTimeCode::generate();
            assert_eq!(code.as_str().len(), CODE_LENGTH);
            assert!(code.as_str().bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn test_digit_distribution_is_uniform() {
        const SAMPLES: usize = 10_000;
        let mut counts = [0usize; 10];
        for _ in 0..SAMPLES {
            for b in OneTimeCode::generate().as_str().bytes() {
                counts[usize::from(b - b'0')] += 1;
            }
        }

        // 60,000 digits, 6,000 expected per bucket. Chi-square with 9 degrees
        // of freedom: 27.88 is the 0.001 critical value.
        #[allow(clippy::cast_precision_loss)]
        let expected = (SAMPLES * CODE_LENGTH) as f64 / 10.0;
        let chi_square: f64 = counts
            .iter()
            .map(|&observed| {
                #[allow(clippy::cast_precision_loss)]
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum();
        assert!(chi_square < 27.88, "chi-square {chi_square} counts {counts:?}");
    }

    #[test]
    fn test_leading_zero_codes_parse() {
        assert_eq!(OneTimeCode::parse("000123").unwrap().as_str(), "000123");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "12345", "1234567", "12a456", " 123456", "１２３４５６"] {
            assert_eq!(OneTimeCode::parse(bad), Err(CodeFormatError), "{bad:?}");
        }
    }

    #[test]
    fn test_debug_is_redacted() {
        let code = OneTimeCode::parse("482913").unwrap();
        assert!(!format!("{code:?}").contains("482913"));
    }

    #[test]
    fn test_hash_and_match() {
        let hasher = fast_hasher();
        let code = OneTimeCode::parse("482913").unwrap();
        let hash = hasher.hash(&code).unwrap();

        assert!(!hash.contains("482913"));
        assert!(hasher.matches(&code, &hash).unwrap());
        assert!(!hasher.matches(&OneTimeCode::parse("482914").unwrap(), &hash).unwrap());
    }

    #[test]
    fn test_same_code_hashes_differently() {
        let hasher = fast_hasher();
        let code = OneTimeCode::parse("111111").unwrap();
        assert_ne!(hasher.hash(&code).unwrap(), hasher.hash(&code).unwrap());
    }

    #[test]
    fn test_corrupt_hash_is_error() {
        let code = OneTimeCode::parse("111111").unwrap();
        assert!(matches!(
            fast_hasher().matches(&code, "not-a-phc-string"),
            Err(VerificationError::CodeHash)
        ));
    }
}
