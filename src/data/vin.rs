//! Vehicle identification number validation
//!
//! A VIN is 17 characters long and never contains the letters I, O or Q.
//! Input is trimmed and upper-cased before it is checked.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Required length of a VIN
pub const VIN_LENGTH: usize = 17;

/// Letters excluded from the VIN character set
const FORBIDDEN: [char; 3] = ['I', 'O', 'Q'];

/// Reasons a string is not a valid VIN
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidVin {
    /// Normalized input is not exactly 17 characters
    #[error("VIN must be exactly 17 characters (got {0})")]
    WrongLength(usize),

    /// Input contains I, O or Q
    #[error("VIN cannot contain I, O, or Q (found '{0}')")]
    ForbiddenCharacter(char),
}

/// A validated, normalized VIN
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Vin(String);

impl Vin {
    /// Normalizes and validates a raw VIN string.
    ///
    /// # Returns
    /// * `Ok(Vin)` holding the trimmed, upper-cased value
    /// * `Err(InvalidVin::WrongLength)` if it is not 17 characters long
    /// * `Err(InvalidVin::ForbiddenCharacter)` if it contains I, O or Q
    pub fn parse(raw: &str) -> Result<Self, InvalidVin> {
        let normalized = raw.trim().to_uppercase();

        let length = normalized.chars().count();
        if length != VIN_LENGTH {
            return Err(InvalidVin::WrongLength(length));
        }

        if let Some(c) = normalized.chars().find(|c| FORBIDDEN.contains(c)) {
            return Err(InvalidVin::ForbiddenCharacter(c));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Vin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Vin {
    type Err = InvalidVin;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
