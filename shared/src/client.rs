//! Client-related types shared between the backend client and the terminal
//!
//! Auth DTOs and the identity the terminal checks out under.

use serde::{Deserialize, Serialize};

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

/// User information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub points: i64,
}

// =============================================================================
// Terminal identity
// =============================================================================

/// Who the current checkout belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Anonymous walk-in customer; earns no points
    Guest { id: String },
    /// Logged-in customer with a bearer credential
    Member { user: UserInfo, token: String },
}

impl Identity {
    /// Fresh guest identity
    pub fn guest() -> Self {
        Identity::Guest {
            id: format!("guest_{}", uuid::Uuid::new_v4().simple()),
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest { .. })
    }

    /// Backend user id; `None` for guests
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Identity::Guest { .. } => None,
            Identity::Member { user, .. } => Some(&user.id),
        }
    }

    /// Bearer credential; `None` for guests
    pub fn token(&self) -> Option<&str> {
        match self {
            Identity::Guest { .. } => None,
            Identity::Member { token, .. } => Some(token),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Identity::Guest { .. } => "Guest",
            Identity::Member { user, .. } if !user.full_name.is_empty() => &user.full_name,
            Identity::Member { user, .. } => &user.username,
        }
    }
}

impl From<LoginResponse> for Identity {
    fn from(login: LoginResponse) -> Self {
        Identity::Member {
            user: login.user,
            token: login.token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_identity_has_no_credentials() {
        let guest = Identity::guest();
        assert!(guest.is_guest());
        assert!(guest.user_id().is_none());
        assert!(guest.token().is_none());
    }

    #[test]
    fn test_member_identity_from_login() {
        let login: LoginResponse = serde_json::from_str(
            r#"{"token":"jwt","user":{"_id":"u9","username":"an","fullName":"An Nguyen"}}"#,
        )
        .unwrap();
        let identity = Identity::from(login);
        assert_eq!(identity.user_id(), Some("u9"));
        assert_eq!(identity.token(), Some("jwt"));
        assert_eq!(identity.display_name(), "An Nguyen");
    }
}
