use bytes::Bytes;
use serde::{Deserialize, Serialize};
use crate::pipeline::model_config::config::{FaceAntiSpoofingClass, FaceQualityClass};

#[derive(Clone)]
pub struct AttendanceCheckinInput {
    pub im_bytes: Bytes,
    pub latitude: f64,
    pub longitude: f64,
    pub spoofing_check: Option<bool>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AttendanceCheckinResultOutput {
    pub face_count: i32,
    pub identity: Option<String>,
    pub usn: Option<String>,
    pub match_distance: Option<f32>,
    pub attendance_marked: bool,
    pub already_marked: bool,
    pub spoofing_check: Option<FaceAntiSpoofingClass>,
    pub face_quality: Option<FaceQualityClass>,
    pub geofence_allowed: bool,
    pub distance_m: f64,
}

impl Default for AttendanceCheckinResultOutput {
    fn default() -> Self {
        AttendanceCheckinResultOutput {
            face_count: 0,
            identity: None,
            usn: None,
            match_distance: None,
            attendance_marked: false,
            already_marked: false,
            spoofing_check: None,
            face_quality: None,
            geofence_allowed: false,
            distance_m: 0.0,
        }
    }
}
