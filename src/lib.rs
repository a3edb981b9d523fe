//! MediLink Rust Client Library
//!
//! A Rust client for the MediLink healthcare companion backend: patients
//! sign up, browse doctors, message them, book appointments, and track
//! prescriptions and reminders. All state lives in the hosted auth
//! service and document store; this crate provides the session context,
//! the live collection adapters and the screen controllers on top.

pub mod alerts;
pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod fetch;
pub mod live;
pub mod models;
pub mod screens;
pub mod store;

use reqwest::Client;
use std::sync::Arc;

use crate::alerts::{AlertSink, LogAlerts, SharedAlerts};
use crate::auth::{Auth, AuthResponse, SessionHandle};
use crate::config::ClientOptions;
use crate::directory::DoctorDirectory;
use crate::error::Error;
use crate::live::LiveClient;
use crate::screens::{
    AppointmentScreen, ChatScreen, DoctorMapScreen, Geolocator, PrescriptionScreen, ReminderScreen,
};
use crate::store::{DocumentStore, StoreClient};

/// The main entry point for the MediLink client
pub struct MediLink {
    /// The base URL for the MediLink project
    pub url: String,
    /// The API key for the MediLink project
    pub key: String,
    /// HTTP client used for requests
    pub http_client: Client,
    /// Auth client and session context
    pub auth: Auth,
    /// Client options
    pub options: ClientOptions,
    session: SessionHandle,
    store: Arc<StoreClient>,
    alerts: SharedAlerts,
}

impl MediLink {
    /// Create a new MediLink client
    ///
    /// # Example
    ///
    /// ```
    /// use medilink_rust::MediLink;
    ///
    /// let medilink = MediLink::new("https://your-project.medilink.app", "your-api-key");
    /// ```
    pub fn new(url: &str, key: &str) -> Self {
        Self::new_with_options(url, key, ClientOptions::default())
    }

    /// Create a new MediLink client with custom options
    pub fn new_with_options(url: &str, key: &str, options: ClientOptions) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().unwrap_or_else(|_| Client::new());

        let session = SessionHandle::new();
        let auth = Auth::new(url, key, http_client.clone(), session.clone());
        let live = Arc::new(LiveClient::new(url, key, options.clone()));
        let store = Arc::new(StoreClient::new(
            url,
            key,
            http_client.clone(),
            session.clone(),
            live,
        ));

        Self {
            url: url.to_string(),
            key: key.to_string(),
            http_client,
            auth,
            options,
            session,
            store,
            alerts: Arc::new(LogAlerts),
        }
    }

    /// Replace the default alert sink with the application's own
    pub fn with_alerts(mut self, alerts: Arc<dyn AlertSink>) -> Self {
        self.alerts = alerts;
        self
    }

    /// The auth client for account management and sign-in
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// The shared session handle read by every adapter
    pub fn session(&self) -> SessionHandle {
        self.session.clone()
    }

    /// The document store client
    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    /// Create an account and write the user's profile document in one
    /// flow. New accounts get the patient role.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        phone: &str,
        password: &str,
    ) -> Result<AuthResponse, Error> {
        let response = self.auth.sign_up(email, password).await?;

        if response.user.is_none() {
            return Err(Error::auth("Sign-up did not return an account"));
        }
        let profile = serde_json::json!({
            "name": name,
            "email": email.trim(),
            "phone": phone,
            "role": "patient",
            "created_at": chrono::Utc::now(),
        });
        self.store.insert("users", profile).await?;

        Ok(response)
    }

    /// The doctor directory
    pub fn directory(&self) -> DoctorDirectory {
        DoctorDirectory::new(self.store())
    }

    /// The appointment screen for one doctor
    pub fn appointments(&self, doctor_id: &str) -> AppointmentScreen {
        AppointmentScreen::new(
            self.store(),
            self.session.clone(),
            self.alerts.clone(),
            doctor_id,
        )
    }

    /// The chat screen for one doctor conversation
    pub fn chat(&self, doctor_id: &str) -> ChatScreen {
        ChatScreen::new(
            self.store(),
            self.session.clone(),
            self.alerts.clone(),
            doctor_id,
        )
    }

    /// The prescription screen
    pub fn prescriptions(&self) -> PrescriptionScreen {
        PrescriptionScreen::new(self.store(), self.session.clone(), self.alerts.clone())
    }

    /// The reminder screen
    pub fn reminders(&self) -> ReminderScreen {
        ReminderScreen::new(self.store(), self.session.clone(), self.alerts.clone())
    }

    /// The doctor map screen over the given device geolocation source
    pub fn doctor_map(&self, geolocator: Arc<dyn Geolocator>) -> DoctorMapScreen {
        DoctorMapScreen::new(geolocator, self.alerts.clone())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::alerts::AlertSink;
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::MediLink;
}
