//! Authentication and session management for MediLink

mod session;
mod types;

use reqwest::Client;
use std::collections::HashMap;

use crate::error::Error;
use crate::fetch::Fetch;

pub use session::SessionHandle;
pub use types::*;

/// Client for the MediLink auth service
pub struct Auth {
    /// The base URL for the MediLink project
    url: String,

    /// The API key for the MediLink project
    key: String,

    /// HTTP client used for requests
    client: Client,

    /// The current session, shared with the collection adapters
    session: SessionHandle,
}

impl Auth {
    /// Create a new Auth client
    pub(crate) fn new(url: &str, key: &str, client: Client, session: SessionHandle) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
            session,
        }
    }

    fn get_auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    /// Sign up a new user with email and password
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse, Error> {
        let url = self.get_auth_url("/signup");

        let mut body = HashMap::new();
        body.insert("email".to_string(), email.trim().to_string());
        body.insert("password".to_string(), password.to_string());

        let result = Fetch::post(&self.client, &url)
            .api_key(&self.key)
            .json(&body)?
            .execute::<AuthResponse>()
            .await?;

        if let Some(session) = result.clone().into_session() {
            self.session.set(session);
        }

        Ok(result)
    }

    /// Sign in a user with email and password
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, Error> {
        let url = self.get_auth_url("/token?grant_type=password");

        let mut body = HashMap::new();
        body.insert("email".to_string(), email.trim().to_string());
        body.insert("password".to_string(), password.to_string());

        let result = Fetch::post(&self.client, &url)
            .api_key(&self.key)
            .json(&body)?
            .execute::<AuthResponse>()
            .await?;

        if let Some(session) = result.clone().into_session() {
            self.session.set(session);
        }

        Ok(result)
    }

    /// Sign out the current user
    pub async fn sign_out(&self) -> Result<(), Error> {
        let url = self.get_auth_url("/logout");

        let token = match self.session.access_token() {
            Some(token) => token,
            None => return Err(Error::auth("Not logged in")),
        };

        Fetch::post(&self.client, &url)
            .api_key(&self.key)
            .bearer_auth(&token)
            .execute_raw()
            .await?;

        self.session.clear();

        Ok(())
    }

    /// Request a password reset email
    pub async fn reset_password_for_email(&self, email: &str) -> Result<(), Error> {
        let url = self.get_auth_url("/recover");

        let mut body = HashMap::new();
        body.insert("email".to_string(), email.trim().to_string());

        Fetch::post(&self.client, &url)
            .api_key(&self.key)
            .json(&body)?
            .execute_raw()
            .await?;

        Ok(())
    }

    /// Fetch the account record for the currently authenticated user
    pub async fn get_user(&self) -> Result<AuthUser, Error> {
        let url = self.get_auth_url("/user");

        let token = match self.session.access_token() {
            Some(token) => token,
            None => return Err(Error::auth("Not logged in")),
        };

        let user = Fetch::get(&self.client, &url)
            .api_key(&self.key)
            .bearer_auth(&token)
            .execute::<AuthUser>()
            .await?;

        Ok(user)
    }

    /// The shared session handle
    pub fn session(&self) -> SessionHandle {
        self.session.clone()
    }

    /// The current identity, if signed in
    pub fn current_identity(&self) -> Option<Identity> {
        self.session.identity()
    }
}
