//! Display colors for wallets and categories.

use std::fmt::Display;

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::Error;

/// A validated hex color of the form `#rrggbb`, stored in lower case.
///
/// This is the format produced by `<input type="color">`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(String);

impl Color {
    /// The color used when the user does not pick one.
    pub const DEFAULT: &'static str = "#3b82f6";

    /// Create a color from a hex string such as "#1A2b3C".
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidColor] if `raw` is not a `#` followed by six hex digits.
    pub fn new(raw: &str) -> Result<Self, Error> {
        let raw = raw.trim();
        let is_valid = raw.len() == 7
            && raw.starts_with('#')
            && raw[1..].chars().all(|c| c.is_ascii_hexdigit());

        if is_valid {
            Ok(Self(raw.to_ascii_lowercase()))
        } else {
            Err(Error::InvalidColor(raw.to_owned()))
        }
    }

    /// Create a color without validation.
    ///
    /// The caller should ensure that the string is a valid `#rrggbb` color.
    pub fn new_unchecked(raw: &str) -> Self {
        Self(raw.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new_unchecked(Self::DEFAULT)
    }
}

impl AsRef<str> for Color {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for Color {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for Color {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(Color::new_unchecked)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, color::Color};

    #[test]
    fn accepts_hex_color() {
        assert_eq!(Color::new("#1A2b3C").unwrap().as_str(), "#1a2b3c");
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(Color::new("  #ffffff\n").unwrap().as_str(), "#ffffff");
    }

    #[test]
    fn rejects_missing_hash() {
        assert_eq!(
            Color::new("ffffff"),
            Err(Error::InvalidColor("ffffff".to_owned()))
        );
    }

    #[test]
    fn rejects_short_and_non_hex_colors() {
        assert!(Color::new("#fff").is_err());
        assert!(Color::new("#gggggg").is_err());
        assert!(Color::new("").is_err());
    }
}
