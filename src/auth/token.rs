//! The token stored in the encrypted auth cookie.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::{Error, auth::UserID};

mod datetime_format {
    //! Serializes a [time::OffsetDateTime] with a fixed width format.
    //!
    //! The default serializer writes midnight as "0:00:00.0", which the
    //! default deserializer then rejects because it expects two hour digits.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
    };

    /// e.g. "2021-01-01 00:00:00.000000 +00:00:00".
    const DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
             sign:mandatory]:[offset_minute]:[offset_second]"
    );

    pub fn serialize<S>(dt: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = dt
            .format(DATE_TIME_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&s, DATE_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Identifies the logged in user and when their session ends.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Token {
    pub user_id: UserID,

    #[serde(
        serialize_with = "datetime_format::serialize",
        deserialize_with = "datetime_format::deserialize"
    )]
    pub expires_at: OffsetDateTime,
}

impl Token {
    /// Create a token for `user_id` that expires `duration` from now.
    ///
    /// The expiry is expressed in `local_offset` so that it reads naturally in logs.
    ///
    /// # Errors
    ///
    /// Returns [Error::DateOverflow] if adding `duration` overflows.
    pub fn new(user_id: UserID, duration: Duration, local_offset: UtcOffset) -> Result<Self, Error> {
        let expires_at = OffsetDateTime::now_utc()
            .to_offset(local_offset)
            .checked_add(duration)
            .ok_or(Error::DateOverflow)?;

        Ok(Self {
            user_id,
            expires_at,
        })
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= OffsetDateTime::now_utc()
    }
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime, UtcOffset, macros::datetime};

    use crate::{Error, auth::UserID, auth::token::Token};

    #[test]
    fn serialise_token() {
        let token = Token {
            user_id: UserID::new(1),
            expires_at: datetime!(2025-12-21 03:54:00).assume_offset(UtcOffset::UTC),
        };
        let expected = r#"{"user_id":1,"expires_at":"2025-12-21 03:54:00.0 +00:00:00"}"#;

        let actual = serde_json::to_string(&token).unwrap();

        assert_eq!(expected, actual);
    }

    #[test]
    fn deserialise_token_with_midnight_expiry() {
        let expected = Token {
            user_id: UserID::new(1),
            expires_at: datetime!(2025-12-21 00:00:00).assume_offset(UtcOffset::UTC),
        };
        let token_string = r#"{"user_id":1,"expires_at":"2025-12-21 00:00:00.0 +00:00:00"}"#;

        let actual: Token = serde_json::from_str(token_string).unwrap();

        assert_eq!(expected, actual);
    }

    #[test]
    fn new_token_expires_after_duration() {
        let offset = UtcOffset::from_hms(13, 0, 0).unwrap();

        let token = Token::new(UserID::new(1), Duration::minutes(5), offset).unwrap();

        let remaining = token.expires_at - OffsetDateTime::now_utc();
        assert!(remaining > Duration::minutes(4) && remaining <= Duration::minutes(5));
        assert_eq!(token.expires_at.offset(), offset);
        assert!(!token.is_expired());
    }

    #[test]
    fn new_token_overflow_is_an_error() {
        let result = Token::new(UserID::new(1), Duration::MAX, UtcOffset::UTC);

        assert_eq!(result, Err(Error::DateOverflow));
    }

    #[test]
    fn token_in_the_past_is_expired() {
        let token = Token {
            user_id: UserID::new(1),
            expires_at: OffsetDateTime::now_utc() - Duration::seconds(1),
        };

        assert!(token.is_expired());
    }
}
