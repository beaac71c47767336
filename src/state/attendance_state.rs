use std::sync::Arc;
use crate::geofence::geofence::Geofence;
use crate::repository::attendance_repo::AttendanceRepository;
use crate::repository::face_gallery::FaceGallery;
use crate::pipeline::recognition_pipeline::recognition_pipeline::RecognitionPipeline;
use crate::service::attendance_service::AttendanceService;

#[derive(Clone)]
pub struct AttendanceState {
    pub attendance_service: AttendanceService,
}

impl AttendanceState {
    pub fn new(
        pipeline: &Arc<RecognitionPipeline>,
        face_gallery: &Arc<FaceGallery>,
        attendance_repository: &Arc<AttendanceRepository>,
        geofence: Geofence,
    ) -> Self {
        Self {
            attendance_service: AttendanceService::new(pipeline, face_gallery, attendance_repository, geofence),
        }
    }
}
