//! Email address type used for admin logins and user profiles.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input is empty after trimming.
    #[error("email cannot be empty")]
    Empty,
    /// The input is longer than the RFC 5321 limit.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not contain exactly one @ symbol.
    #[error("email must contain exactly one @ symbol")]
    AtSymbol,
    /// The input contains whitespace.
    #[error("email cannot contain whitespace")]
    Whitespace,
    /// The local part or the domain is empty.
    #[error("email must have text on both sides of @")]
    MissingPart,
}

/// An email address.
///
/// Surrounding whitespace is trimmed, so addresses typed at a prompt parse
/// cleanly. The server remains the authority on whether an account exists.
///
/// ```
/// use srisri_core::Email;
///
/// assert_eq!(Email::parse("  a@b.com ").unwrap().as_str(), "a@b.com");
/// assert!(Email::parse("a@@b.com").is_err());
/// assert!(Email::parse("a b@c.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, too long, contains
    /// whitespace, or does not split into a non-empty local part and domain
    /// around a single @.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let mut parts = s.split('@');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) => {
                if local.is_empty() || domain.is_empty() {
                    return Err(EmailError::MissingPart);
                }
            }
            _ => return Err(EmailError::AtSymbol),
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_emails() {
        assert!(Email::parse("admin@srisriethnics.in").is_ok());
        assert!(Email::parse("user+tag@example.co.uk").is_ok());
        assert!(Email::parse("a@b.com").is_ok());
    }

    #[test]
    fn test_parse_trims() {
        let email = Email::parse("\ta@b.com\n").unwrap();
        assert_eq!(email.as_str(), "a@b.com");
    }

    #[test]
    fn test_parse_rejections() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("no-at"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("a@b@c"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("@b.com"), Err(EmailError::MissingPart));
        assert_eq!(Email::parse("a@"), Err(EmailError::MissingPart));
        assert_eq!(Email::parse("a b@c.com"), Err(EmailError::Whitespace));

        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(Email::parse(&long), Err(EmailError::TooLong { .. })));
    }

    #[test]
    fn test_serde_is_transparent() {
        let email: Email = serde_json::from_str("\"a@b.com\"").unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"a@b.com\"");
    }
}
