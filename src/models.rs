//! Domain records stored in the backend collections
//!
//! All records are documents with server-issued opaque ids. Timestamps
//! are RFC 3339 strings on the wire; `date` and `time` on appointments
//! stay plain strings ("YYYY-MM-DD" / "HH:MM") exactly as entered in
//! the form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Error;
use crate::live::{DraftRecord, LiveRecord};
use crate::store::Sort;

/// Role of a user profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
}

/// Profile document in the `users` collection. Created at signup;
/// mutated only by the (external) profile-update flow; never deleted
/// in-app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// Appointment status as set by doctor-side tooling. The patient client
/// only ever writes `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// Display color for an appointment status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Amber,
    Green,
    Red,
    Gray,
}

impl StatusColor {
    /// CSS-style hex value for the color
    pub fn hex(&self) -> &'static str {
        match self {
            StatusColor::Amber => "#ffb300",
            StatusColor::Green => "#43a047",
            StatusColor::Red => "#e53935",
            StatusColor::Gray => "#9e9e9e",
        }
    }
}

impl AppointmentStatus {
    /// Total status-to-color mapping; unrecognized statuses are gray
    pub fn color(&self) -> StatusColor {
        match self {
            AppointmentStatus::Pending => StatusColor::Amber,
            AppointmentStatus::Confirmed => StatusColor::Green,
            AppointmentStatus::Cancelled => StatusColor::Red,
            AppointmentStatus::Unknown => StatusColor::Gray,
        }
    }
}

/// Appointment booked by a patient against a doctor. `doctor_id` and
/// `user_id` are immutable after creation; `created_at` is the sole
/// sort key, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub doctor_id: String,
    pub user_id: String,
    pub date: String,
    pub time: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

/// A new appointment before it is written
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub doctor_id: String,
    pub date: String,
    pub time: String,
}

impl LiveRecord for Appointment {
    const COLLECTION: &'static str = "appointments";
    type Draft = NewAppointment;

    fn sort() -> Sort {
        Sort::descending("created_at")
    }
}

impl DraftRecord for NewAppointment {
    fn validate(&self) -> Result<(), Error> {
        if self.date.trim().is_empty() || self.time.trim().is_empty() {
            return Err(Error::validation("Please enter a date and a time."));
        }
        Ok(())
    }

    fn into_fields(self, owner_id: &str, now: DateTime<Utc>) -> Value {
        json!({
            "doctor_id": self.doctor_id,
            "user_id": owner_id,
            "date": self.date,
            "time": self.time,
            "status": AppointmentStatus::Pending,
            "created_at": now,
        })
    }
}

/// One chat message between a patient and a doctor. Conversation
/// identity is the (doctor_id, user_id) pair; `sent_at` is the sort
/// key, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub doctor_id: String,
    pub user_id: String,
    pub message: String,
    pub read: bool,
    pub sent_at: DateTime<Utc>,
}

/// A new chat message before it is sent
#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub doctor_id: String,
    pub message: String,
}

impl LiveRecord for ChatMessage {
    const COLLECTION: &'static str = "messages";
    type Draft = NewChatMessage;

    fn sort() -> Sort {
        Sort::ascending("sent_at")
    }
}

impl DraftRecord for NewChatMessage {
    fn validate(&self) -> Result<(), Error> {
        if self.message.trim().is_empty() {
            return Err(Error::validation("Cannot send an empty message."));
        }
        Ok(())
    }

    fn into_fields(self, owner_id: &str, now: DateTime<Utc>) -> Value {
        json!({
            "doctor_id": self.doctor_id,
            "user_id": owner_id,
            "message": self.message,
            "read": false,
            "sent_at": now,
        })
    }
}

/// Prescription tracked by its owner; sort key `start_date`, ascending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// A new prescription before it is written. All fields are required.
#[derive(Debug, Clone)]
pub struct NewPrescription {
    pub title: String,
    pub description: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl LiveRecord for Prescription {
    const COLLECTION: &'static str = "prescriptions";
    type Draft = NewPrescription;

    fn sort() -> Sort {
        Sort::ascending("start_date")
    }
}

impl DraftRecord for NewPrescription {
    fn validate(&self) -> Result<(), Error> {
        if self.title.trim().is_empty()
            || self.description.trim().is_empty()
            || self.start_date.is_none()
            || self.end_date.is_none()
        {
            return Err(Error::validation("Please fill all fields"));
        }
        Ok(())
    }

    fn into_fields(self, owner_id: &str, _now: DateTime<Utc>) -> Value {
        json!({
            "user_id": owner_id,
            "title": self.title,
            "description": self.description,
            "start_date": self.start_date,
            "end_date": self.end_date,
        })
    }
}

/// Reminder ("rappel") owned by one user; same lifecycle shape as a
/// prescription, independent collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// A new reminder before it is written. The description is optional.
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub title: String,
    pub description: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl LiveRecord for Reminder {
    const COLLECTION: &'static str = "rappels";
    type Draft = NewReminder;

    fn sort() -> Sort {
        Sort::ascending("start_date")
    }
}

impl DraftRecord for NewReminder {
    fn validate(&self) -> Result<(), Error> {
        if self.title.trim().is_empty() || self.start_date.is_none() || self.end_date.is_none() {
            return Err(Error::validation("Please fill all fields"));
        }
        Ok(())
    }

    fn into_fields(self, owner_id: &str, _now: DateTime<Utc>) -> Value {
        json!({
            "user_id": owner_id,
            "title": self.title,
            "description": self.description,
            "start_date": self.start_date,
            "end_date": self.end_date,
        })
    }
}

/// Working hours for one weekday; blank strings mean closed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub start: String,
    pub end: String,
}

impl DaySchedule {
    fn open(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    fn closed() -> Self {
        Self {
            start: String::new(),
            end: String::new(),
        }
    }
}

/// Weekly working hours displayed on the appointment screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSchedule {
    pub monday: DaySchedule,
    pub tuesday: DaySchedule,
    pub wednesday: DaySchedule,
    pub thursday: DaySchedule,
    pub friday: DaySchedule,
    pub saturday: DaySchedule,
    pub sunday: DaySchedule,
}

impl Default for WeekSchedule {
    /// The week shown when a doctor has no schedule document
    fn default() -> Self {
        let weekday = || DaySchedule::open("08:00", "17:00");
        Self {
            monday: weekday(),
            tuesday: weekday(),
            wednesday: weekday(),
            thursday: weekday(),
            friday: weekday(),
            saturday: DaySchedule::open("09:00", "13:00"),
            sunday: DaySchedule::closed(),
        }
    }
}

/// Side document in `doctor_schedule`, read once per appointment
/// screen; never written by this client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSchedule {
    pub id: String,
    pub doctor_id: String,
    pub working_hours: WeekSchedule,
}
