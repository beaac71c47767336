use std::sync::Arc;
use crate::pipeline::recognition_pipeline::recognition_pipeline::RecognitionPipeline;
use crate::repository::enrollment_repo::EnrollmentRepository;
use crate::repository::face_gallery::FaceGallery;
use crate::service::enrollment_service::EnrollmentService;

#[derive(Clone)]
pub struct EnrollmentState {
    pub enrollment_service: EnrollmentService,
}

impl EnrollmentState {
    pub fn new(
        pipeline: &Arc<RecognitionPipeline>,
        enrollment_repository: &Arc<EnrollmentRepository>,
        face_gallery: &Arc<FaceGallery>,
    ) -> Self {
        Self {
            enrollment_service: EnrollmentService::new(pipeline, enrollment_repository, face_gallery),
        }
    }
}
