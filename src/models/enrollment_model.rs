use bytes::Bytes;
use serde::{Deserialize, Serialize};
use crate::pipeline::model_config::config::FaceQualityClass;

#[derive(Clone)]
pub struct EnrollmentRegisterInput {
    pub im_bytes: Bytes,
    pub name: String,
    pub usn: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EnrollmentRegisterResultOutput {
    pub name: String,
    pub usn: String,
    pub photo_path: String,
    pub gallery_size: usize,
    pub face_quality: Option<FaceQualityClass>,
}

/// Why a registration frame could not be enrolled.
#[derive(Clone, Serialize, Deserialize)]
pub struct EnrollmentRejection {
    pub face_count: i32,
    pub face_quality: Option<FaceQualityClass>,
    pub reason: String,
}
