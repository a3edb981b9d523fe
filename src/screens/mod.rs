//! Screen controllers
//!
//! One controller per screen: it owns the screen's live collection
//! adapter and form state, and translates submit/delete intents into
//! adapter calls. Rendering, styling and navigation stay in the
//! embedding application; the controllers expose the ordered lists and
//! an update signal to re-render on.

mod appointment;
mod chat;
mod doctor_map;
mod prescription;
mod reminder;

pub use appointment::AppointmentScreen;
pub use chat::ChatScreen;
pub use doctor_map::{DoctorMapScreen, DoctorPoint, GeoPoint, Geolocator, Route};
pub use prescription::PrescriptionScreen;
pub use reminder::ReminderScreen;
