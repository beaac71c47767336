use crate::config::settings::SETTINGS;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy)]
pub struct GeofenceCheck {
    pub distance_m: f64,
    pub allowed: bool,
}

#[derive(Debug, Clone)]
pub struct Geofence {
    latitude: f64,
    longitude: f64,
    allowed_radius_m: f64,
}

impl Geofence {
    pub fn new(latitude: f64, longitude: f64, allowed_radius_m: f64) -> Self {
        Geofence {
            latitude,
            longitude,
            allowed_radius_m,
        }
    }

    pub fn from_settings() -> Self {
        Geofence::new(
            SETTINGS.geofence.latitude,
            SETTINGS.geofence.longitude,
            SETTINGS.geofence.allowed_radius_m,
        )
    }

    pub fn allowed_radius_m(&self) -> f64 {
        self.allowed_radius_m
    }

    pub fn check(&self, latitude: f64, longitude: f64) -> GeofenceCheck {
        let distance_m = haversine_distance_m(latitude, longitude, self.latitude, self.longitude);
        GeofenceCheck {
            distance_m,
            allowed: distance_m <= self.allowed_radius_m,
        }
    }
}

pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}
