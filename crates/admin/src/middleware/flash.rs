//! One-shot toast messages.
//!
//! A handler that redirects stores a [`Flash`] in the session; the next page
//! render takes it (removing it) and shows it as a toast.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// Toast style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

impl FlashLevel {
    /// CSS modifier used by the toast partial.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// A toast message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }

    /// The generic failure toast.
    #[must_use]
    pub fn something_went_wrong() -> Self {
        Self::error("Something went wrong.")
    }

    /// Store this message for the next page render.
    ///
    /// A failure to write the session only loses the toast, so it is logged
    /// rather than returned.
    pub async fn set(self, session: &Session) {
        if let Err(e) = session.insert(session_keys::FLASH, self).await {
            tracing::warn!(error = %e, "Failed to store flash message");
        }
    }

    /// Take the pending message, if any.
    pub async fn take(session: &Session) -> Option<Self> {
        session
            .remove::<Self>(session_keys::FLASH)
            .await
            .ok()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_flash_is_taken_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        Flash::success("Size created.").set(&session).await;
        assert_eq!(Flash::take(&session).await, Some(Flash::success("Size created.")));
        assert_eq!(Flash::take(&session).await, None);
    }

    #[test]
    fn test_level_serializes_lowercase() {
        let json = serde_json::to_string(&Flash::something_went_wrong()).expect("json");
        assert_eq!(json, r#"{"level":"error","message":"Something went wrong."}"#);
        assert_eq!(FlashLevel::Success.as_str(), "success");
    }
}
