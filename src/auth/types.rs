//! Types for authentication and session state

use serde::{Deserialize, Serialize};

/// Account record held by the auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    /// The user ID
    pub id: String,

    /// The user's email address
    pub email: Option<String>,

    /// The user's phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// The creation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// The last sign-in time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sign_in_at: Option<String>,
}

/// The current authenticated identity, read by every adapter to scope
/// its collection queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// The user ID
    pub id: String,

    /// The user's email address
    pub email: Option<String>,
}

/// Session data returned by the auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The access token
    pub access_token: String,

    /// The token type
    pub token_type: String,

    /// The expiry time in seconds
    pub expires_in: i64,

    /// The refresh token
    pub refresh_token: String,

    /// The signed-in account
    pub user: AuthUser,
}

impl Session {
    /// The identity carried by this session
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.user.id.clone(),
            email: self.user.email.clone(),
        }
    }
}

/// Response to sign-up and sign-in requests
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// The access token
    pub access_token: Option<String>,

    /// The token type
    pub token_type: Option<String>,

    /// The expiry time in seconds
    pub expires_in: Option<i64>,

    /// The refresh token
    pub refresh_token: Option<String>,

    /// The account record
    pub user: Option<AuthUser>,

    /// Any error that occurred
    pub error: Option<String>,

    /// The error description
    pub error_description: Option<String>,
}

impl AuthResponse {
    /// Convert into a session when the response carries one.
    ///
    /// Sign-up with email confirmation enabled returns an account but no
    /// tokens; in that case there is no session yet.
    pub fn into_session(self) -> Option<Session> {
        match (
            self.access_token,
            self.refresh_token,
            self.user,
        ) {
            (Some(access_token), Some(refresh_token), Some(user)) => Some(Session {
                access_token,
                token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
                expires_in: self.expires_in.unwrap_or(3600),
                refresh_token,
                user,
            }),
            _ => None,
        }
    }
}
