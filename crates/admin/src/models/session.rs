//! Session-related types for dashboard authentication.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use storekeep_core::UserId;

/// Session-stored user identity.
///
/// Built from a verified identity-provider session token. Only the claims
/// the dashboard displays are kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUser {
    /// Identity-provider user id (`sub` claim).
    pub id: UserId,
    /// Email address, when the provider includes it.
    pub email: Option<String>,
    /// Display name, when the provider includes it.
    pub name: Option<String>,
}

impl CurrentUser {
    /// Best available label for the navbar user button.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or_else(|| self.id.as_str())
    }

    /// Single-letter avatar for the user button.
    #[must_use]
    pub fn initial(&self) -> String {
        self.display_name()
            .chars()
            .next()
            .map_or_else(|| "?".to_string(), |c| c.to_uppercase().to_string())
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the sign-in `state` nonce while the browser is at the identity provider.
    pub const SIGN_IN_STATE: &str = "sign_in_state";

    /// Key for the one-shot toast message shown on the next page.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: Option<&str>, email: Option<&str>) -> CurrentUser {
        CurrentUser {
            id: UserId::parse("user_123").expect("valid"),
            email: email.map(String::from),
            name: name.map(String::from),
        }
    }

    #[test]
    fn test_display_name_prefers_name_then_email_then_id() {
        assert_eq!(user(Some("Ada"), Some("ada@x.dev")).display_name(), "Ada");
        assert_eq!(user(None, Some("ada@x.dev")).display_name(), "ada@x.dev");
        assert_eq!(user(None, None).display_name(), "user_123");
    }

    #[test]
    fn test_initial_is_uppercase() {
        assert_eq!(user(Some("ada"), None).initial(), "A");
    }
}
