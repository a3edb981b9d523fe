//! Appointment booking screen
//!
//! Lists the patient's appointments with one doctor (newest first),
//! books new ones, and shows the doctor's weekly availability. The
//! patient view is read/create only; status changes come from
//! doctor-side tooling and arrive through the live query.

use log::debug;
use std::sync::Arc;
use tokio::sync::watch;

use crate::alerts::SharedAlerts;
use crate::auth::SessionHandle;
use crate::error::Error;
use crate::live::{AdapterState, LiveCollectionAdapter};
use crate::models::{Appointment, DoctorSchedule, NewAppointment, WeekSchedule};
use crate::store::{CollectionQuery, DocumentStore, FieldFilter};

/// Controller for the appointment screen
pub struct AppointmentScreen {
    adapter: LiveCollectionAdapter<Appointment>,
    store: Arc<dyn DocumentStore>,
    alerts: SharedAlerts,
    doctor_id: String,
    availability: WeekSchedule,

    /// Date form field, "YYYY-MM-DD"
    pub date: String,
    /// Time form field, "HH:MM"
    pub time: String,
}

impl AppointmentScreen {
    /// Create the screen for one doctor
    pub fn new(
        store: Arc<dyn DocumentStore>,
        session: SessionHandle,
        alerts: SharedAlerts,
        doctor_id: &str,
    ) -> Self {
        Self {
            adapter: LiveCollectionAdapter::new(store.clone(), session, alerts.clone()),
            store,
            alerts,
            doctor_id: doctor_id.to_string(),
            availability: WeekSchedule::default(),
            date: String::new(),
            time: String::new(),
        }
    }

    /// Subscribe to the appointment list and read the doctor's schedule
    /// document once. A missing schedule keeps the default week.
    pub async fn open(&mut self) -> Result<(), Error> {
        self.adapter
            .subscribe(vec![FieldFilter::new("doctor_id", self.doctor_id.as_str())])
            .await?;

        let query =
            CollectionQuery::new("doctor_schedule").eq("doctor_id", self.doctor_id.as_str());
        let docs = self.store.fetch(&query).await?;
        match docs.first() {
            Some(doc) => {
                let schedule: DoctorSchedule = doc.deserialize()?;
                self.availability = schedule.working_hours;
            }
            None => debug!("no schedule document for doctor {}", self.doctor_id),
        }
        Ok(())
    }

    /// Book an appointment from the current form fields. On success the
    /// fields are cleared and a confirmation alert is shown; the list
    /// updates on the next push.
    pub async fn submit(&mut self) -> Result<(), Error> {
        let draft = NewAppointment {
            doctor_id: self.doctor_id.clone(),
            date: self.date.clone(),
            time: self.time.clone(),
        };
        self.adapter.create(draft).await?;

        self.date.clear();
        self.time.clear();
        self.alerts.alert("MediLink", "Appointment created");
        Ok(())
    }

    /// The mirrored appointment list, newest first
    pub fn appointments(&self) -> Vec<Appointment> {
        self.adapter.items()
    }

    /// The doctor's weekly availability
    pub fn availability(&self) -> &WeekSchedule {
        &self.availability
    }

    /// Adapter lifecycle state
    pub fn state(&self) -> AdapterState {
        self.adapter.state()
    }

    /// Signal that changes when a push has been applied
    pub fn updates(&self) -> watch::Receiver<u64> {
        self.adapter.updates()
    }

    /// Tear the screen down; the list stops following backend changes
    pub fn close(&self) {
        self.adapter.unsubscribe();
    }
}
