//! User-supplied identity.

use std::fmt;

use crate::error::CoreError;

/// Prefix every Cursor user id carries.
pub const USER_ID_PREFIX: &str = "user_";

/// Cookie holding the Cursor web session.
pub const SESSION_COOKIE_NAME: &str = "WorkosCursorSessionToken";

/// User id and session cookie.
///
/// Read-only to the fetch layer. `Debug` never prints the cookie.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    user_id: String,
    cookie: String,
}

impl Credentials {
    /// Creates credentials, trimming surrounding whitespace.
    pub fn new(user_id: impl Into<String>, cookie: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into().trim().to_string(),
            cookie: cookie.into().trim().to_string(),
        }
    }

    /// The Cursor user id (`user_...`).
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The raw `Cookie` header value.
    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    /// Returns true if both fields are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.user_id.is_empty() && !self.cookie.is_empty()
    }

    /// Returns true if the user id looks like a Cursor user id.
    ///
    /// A mismatch is only worth a warning; the server is the judge.
    pub fn has_expected_user_prefix(&self) -> bool {
        self.user_id.starts_with(USER_ID_PREFIX)
    }

    /// Returns true if the cookie carries the Cursor session token.
    pub fn has_session_cookie(&self) -> bool {
        self.cookie.contains(SESSION_COOKIE_NAME)
    }

    /// Checks that both fields are present.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::MissingCredentials` naming the first empty field.
    pub fn require_complete(&self) -> Result<(), CoreError> {
        if self.user_id.is_empty() {
            return Err(CoreError::MissingCredentials("userId"));
        }
        if self.cookie.is_empty() {
            return Err(CoreError::MissingCredentials("cookieString"));
        }
        Ok(())
    }

    /// Extracts the user id embedded in a `WorkosCursorSessionToken` cookie.
    ///
    /// The token value has the form `user_XXXX%3A%3A<jwt>` (or with a literal
    /// `::` separator once decoded).
    pub fn user_id_from_cookie(cookie: &str) -> Option<String> {
        let value = cookie.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name.trim() == SESSION_COOKIE_NAME).then_some(value.trim())
        })?;

        let user_id = value
            .split_once("%3A%3A")
            .or_else(|| value.split_once("%3a%3a"))
            .or_else(|| value.split_once("::"))
            .map_or(value, |(user, _)| user);

        (user_id.starts_with(USER_ID_PREFIX) && user_id.len() > USER_ID_PREFIX.len())
            .then(|| user_id.to_string())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("cookie", &format_args!("<{} chars redacted>", self.cookie.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_completeness() {
        let creds = Credentials::new("  user_01ABC ", " a=b ");
        assert_eq!(creds.user_id(), "user_01ABC");
        assert_eq!(creds.cookie(), "a=b");
        assert!(creds.is_complete());
        assert!(creds.require_complete().is_ok());
    }

    #[test]
    fn test_missing_fields() {
        let no_user = Credentials::new("", "a=b");
        assert!(!no_user.is_complete());
        assert!(matches!(
            no_user.require_complete(),
            Err(CoreError::MissingCredentials("userId"))
        ));

        let no_cookie = Credentials::new("user_1", "   ");
        assert!(matches!(
            no_cookie.require_complete(),
            Err(CoreError::MissingCredentials("cookieString"))
        ));
    }

    #[test]
    fn test_user_prefix() {
        assert!(Credentials::new("user_01ABC", "x").has_expected_user_prefix());
        assert!(!Credentials::new("01ABC", "x").has_expected_user_prefix());
    }

    #[test]
    fn test_debug_redacts_cookie() {
        let creds = Credentials::new("user_1", "WorkosCursorSessionToken=secret");
        let debug = format!("{creds:?}");
        assert!(debug.contains("user_1"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_user_id_from_encoded_cookie() {
        let cookie = "NEXT_LOCALE=en; WorkosCursorSessionToken=user_01JP4J5TVV%3A%3AeyJhbGci.abc; other=1";
        assert_eq!(
            Credentials::user_id_from_cookie(cookie),
            Some("user_01JP4J5TVV".to_string())
        );
    }

    #[test]
    fn test_user_id_from_decoded_cookie() {
        let cookie = "WorkosCursorSessionToken=user_XYZ::token";
        assert_eq!(
            Credentials::user_id_from_cookie(cookie),
            Some("user_XYZ".to_string())
        );
    }

    #[test]
    fn test_user_id_from_cookie_missing() {
        assert_eq!(Credentials::user_id_from_cookie("session=abc"), None);
        assert_eq!(
            Credentials::user_id_from_cookie("WorkosCursorSessionToken=notauser%3A%3Ax"),
            None
        );
    }
}
