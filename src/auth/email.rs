use std::fmt::Display;

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::Error;

/// An email address that identifies a user.
///
/// Emails are trimmed and lower-cased so that "Foo@Bar.com " and "foo@bar.com"
/// refer to the same account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Create and validate an email address.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidEmail] if `raw_email` does not have exactly one
    /// '@' with text on either side, or the domain has no dot.
    pub fn new(raw_email: &str) -> Result<Self, Error> {
        let email = raw_email.trim().to_lowercase();

        let is_valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !email.chars().any(char::is_whitespace)
            }
            None => false,
        };

        if is_valid {
            Ok(Self(email))
        } else {
            Err(Error::InvalidEmail(raw_email.to_owned()))
        }
    }

    /// Create a new `Email` without any validation.
    ///
    /// The caller should ensure that `raw_email` is a correctly formatted, lower-case email address.
    pub fn new_unchecked(raw_email: &str) -> Self {
        Self(raw_email.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for Email {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for Email {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(Email::new_unchecked)
    }
}

#[cfg(test)]
mod email_tests {
    use crate::{Error, auth::Email};

    #[test]
    fn create_email_normalizes_case_and_whitespace() {
        let email = Email::new("  Foo@Bar.Baz ").unwrap();

        assert_eq!(email.as_str(), "foo@bar.baz");
    }

    #[test]
    fn create_email_fails_with_no_at_symbol() {
        assert_eq!(
            Email::new("foobar.baz"),
            Err(Error::InvalidEmail("foobar.baz".to_owned()))
        );
    }

    #[test]
    fn create_email_fails_with_empty_parts() {
        assert!(Email::new("").is_err());
        assert!(Email::new("@bar.baz").is_err());
        assert!(Email::new("foo@").is_err());
        assert!(Email::new("foo@bar").is_err());
    }

    #[test]
    fn create_email_fails_with_two_at_symbols() {
        assert!(Email::new("foo@bar@baz.com").is_err());
    }
}
