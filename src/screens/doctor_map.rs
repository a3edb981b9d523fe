//! Doctor map screen
//!
//! Presentation glue for the mapping widget: a set of named doctor
//! points and a route from the device's current position to a selected
//! one. Tiles and route drawing belong to the embedding map widget;
//! this controller only produces the waypoints. Geolocation failure
//! surfaces an alert and the feature degrades (no route drawn).

use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use crate::alerts::SharedAlerts;
use crate::error::Error;

/// A latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// A named doctor or clinic location
#[derive(Debug, Clone, PartialEq)]
pub struct DoctorPoint {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl DoctorPoint {
    pub fn new(name: &str, lat: f64, lon: f64) -> Self {
        Self {
            name: name.to_string(),
            lat,
            lon,
        }
    }
}

/// Device geolocation source
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// The device's current position; errors when geolocation is
    /// unavailable or denied
    async fn current_position(&self) -> Result<GeoPoint, Error>;
}

/// A route for the map widget: device position first, destination last
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub waypoints: [GeoPoint; 2],
}

/// Controller for the doctor map screen
pub struct DoctorMapScreen {
    geolocator: Arc<dyn Geolocator>,
    alerts: SharedAlerts,
    points: Vec<DoctorPoint>,
}

impl DoctorMapScreen {
    /// Create the screen with the built-in point set
    pub fn new(geolocator: Arc<dyn Geolocator>, alerts: SharedAlerts) -> Self {
        Self::with_points(geolocator, alerts, Self::default_points())
    }

    /// Create the screen with a custom point set
    pub fn with_points(
        geolocator: Arc<dyn Geolocator>,
        alerts: SharedAlerts,
        points: Vec<DoctorPoint>,
    ) -> Self {
        Self {
            geolocator,
            alerts,
            points,
        }
    }

    /// The hospitals, clinics and private practices shown by default
    pub fn default_points() -> Vec<DoctorPoint> {
        vec![
            DoctorPoint::new("Hopital Régional de Gabés Mohamed Ben Sassi", 33.8815, 10.0982),
            DoctorPoint::new("Les Urgences - Hôpital de Gabès", 33.8840, 10.1020),
            DoctorPoint::new("Clinic Mtorrech", 33.8900, 10.1000),
            DoctorPoint::new("Clinique Elmanara", 33.8860, 10.0940),
            DoctorPoint::new("Cabinet Dr. Ali", 33.8830, 10.0930),
            DoctorPoint::new("Cabinet Dr. Fatima", 33.8850, 10.0960),
        ]
    }

    /// All plottable points
    pub fn points(&self) -> &[DoctorPoint] {
        &self.points
    }

    /// Find a point by its display name
    pub fn point_named(&self, name: &str) -> Option<&DoctorPoint> {
        self.points.iter().find(|p| p.name == name)
    }

    /// Route from the device's current position to the given point.
    /// Returns `None` and alerts when geolocation fails.
    pub async fn route_to(&self, point: &DoctorPoint) -> Option<Route> {
        match self.geolocator.current_position().await {
            Ok(position) => {
                debug!("routing from {:?} to {}", position, point.name);
                Some(Route {
                    waypoints: [
                        position,
                        GeoPoint {
                            lat: point.lat,
                            lon: point.lon,
                        },
                    ],
                })
            }
            Err(e) => {
                self.alerts.alert("Error", &format!("Geolocation failed: {}", e));
                None
            }
        }
    }
}
