//! Doctor directory
//!
//! One-shot fetch (not live) of every user with the doctor role, plus a
//! client-side substring search over name and specialty. The full set is
//! kept in memory and re-filtered on every keystroke; no backend round
//! trip per search and no pagination, since the doctor set stays small.

use log::warn;
use std::sync::{Arc, RwLock};

use crate::error::Error;
use crate::models::{Role, UserProfile};
use crate::store::{CollectionQuery, DocumentStore};

/// Directory of doctors, fetched once per screen
pub struct DoctorDirectory {
    store: Arc<dyn DocumentStore>,
    doctors: RwLock<Vec<UserProfile>>,
}

impl DoctorDirectory {
    /// Create a directory over the given store
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            doctors: RwLock::new(Vec::new()),
        }
    }

    /// Fetch all users with the doctor role into memory
    pub async fn load(&self) -> Result<(), Error> {
        let query = CollectionQuery::new("users").eq("role", "doctor");
        let docs = self.store.fetch(&query).await?;

        let mut doctors = Vec::with_capacity(docs.len());
        for doc in &docs {
            match doc.deserialize::<UserProfile>() {
                Ok(profile) if profile.role == Role::Doctor => doctors.push(profile),
                Ok(profile) => warn!("directory returned non-doctor profile {}", profile.id),
                Err(e) => warn!("skipping malformed user document {}: {}", doc.id, e),
            }
        }
        *self.doctors.write().unwrap() = doctors;
        Ok(())
    }

    /// All loaded doctors
    pub fn all(&self) -> Vec<UserProfile> {
        self.doctors.read().unwrap().clone()
    }

    /// Case-insensitive substring match against name or specialty,
    /// recomputed from the full in-memory set
    pub fn search(&self, needle: &str) -> Vec<UserProfile> {
        self.doctors
            .read()
            .unwrap()
            .iter()
            .filter(|profile| matches(profile, needle))
            .cloned()
            .collect()
    }

    /// One-shot lookup of the profile document for the given email,
    /// used by the dashboard to greet the signed-in user
    pub async fn profile_for(&self, email: &str) -> Result<Option<UserProfile>, Error> {
        let query = CollectionQuery::new("users").eq("email", email);
        let docs = self.store.fetch(&query).await?;
        match docs.first() {
            Some(doc) => Ok(Some(doc.deserialize()?)),
            None => Ok(None),
        }
    }
}

fn matches(profile: &UserProfile, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    profile.name.to_lowercase().contains(&needle)
        || profile
            .specialty
            .as_deref()
            .map(|s| s.to_lowercase().contains(&needle))
            .unwrap_or(false)
}
