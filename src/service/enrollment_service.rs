use std::fs;
use std::sync::Arc;
use anyhow::Error;
use log::{error, info, warn};
use crate::models::enrollment_model::{EnrollmentRegisterInput, EnrollmentRegisterResultOutput, EnrollmentRejection};
use crate::pipeline::module::face_matching::GalleryEntry;
use crate::pipeline::recognition_pipeline::recognition_pipeline::RecognitionPipeline;
use crate::repository::enrollment_repo::EnrollmentRepository;
use crate::repository::face_gallery::FaceGallery;

pub enum RegisterOutcome {
    Registered(EnrollmentRegisterResultOutput),
    Rejected(EnrollmentRejection),
}

#[derive(Clone)]
pub struct EnrollmentService {
    recognition_pipeline: Arc<RecognitionPipeline>,
    enrollment_repository: Arc<EnrollmentRepository>,
    face_gallery: Arc<FaceGallery>,
}

impl EnrollmentService {
    pub fn new(
        recognition_pipeline: &Arc<RecognitionPipeline>,
        enrollment_repository: &Arc<EnrollmentRepository>,
        face_gallery: &Arc<FaceGallery>,
    ) -> Self {
        EnrollmentService {
            recognition_pipeline: Arc::clone(recognition_pipeline),
            enrollment_repository: Arc::clone(enrollment_repository),
            face_gallery: Arc::clone(face_gallery),
        }
    }

    /// Registers a new student: the frame must contain one dominant,
    /// good-quality face. The photo and roster row are persisted and the
    /// embedding goes straight into the gallery.
    pub async fn register(&self, input: EnrollmentRegisterInput) -> Result<RegisterOutcome, Error> {
        let name = normalize_name(&input.name);
        let usn = input.usn.trim().to_uppercase();

        if name.is_empty() || usn.is_empty() {
            return Ok(RegisterOutcome::Rejected(EnrollmentRejection {
                face_count: 0,
                face_quality: None,
                reason: "name and usn are required".to_string(),
            }));
        }

        let pipeline = Arc::clone(&self.recognition_pipeline);
        let im_bytes = input.im_bytes.clone();
        let result = tokio::task::spawn_blocking(move || {
            pipeline.extract(&im_bytes, None, Some(true))
        })
        .await?;
        let result = match result {
            Ok(result) => {result}
            Err(e) => {
                error!("failed to extract face for enrollment: {e}");
                return Err(e)
            }
        };

        let facial_feature = match result.facial_feature {
            Some(facial_feature) => facial_feature,
            None => {
                return Ok(RegisterOutcome::Rejected(EnrollmentRejection {
                    face_count: result.face_count,
                    face_quality: result.face_quality,
                    reason: "no usable face in frame".to_string(),
                }))
            }
        };

        let photo_path = match self.enrollment_repository.save_photo(&name, &usn, &input.im_bytes) {
            Ok(photo_path) => {photo_path}
            Err(e) => {
                error!("failed to persist enrollment photo: {e}");
                return Err(e)
            }
        };

        self.face_gallery.add(GalleryEntry {
            name: name.clone(),
            usn: usn.clone(),
            embedding: facial_feature,
        });

        info!("registered {name} ({usn})");
        Ok(RegisterOutcome::Registered(EnrollmentRegisterResultOutput {
            name,
            usn,
            photo_path: photo_path.to_string_lossy().to_string(),
            gallery_size: self.face_gallery.len(),
            face_quality: result.face_quality,
        }))
    }

    /// Startup warm-up: embed every stored photo into the gallery. Photos
    /// without a usable face are skipped, not fatal.
    pub fn warm_up(&self) -> Result<usize, Error> {
        let uid_map = self.enrollment_repository.load_uid_map()?;
        let mut loaded = 0usize;

        for (name, photo_path) in self.enrollment_repository.list_photos()? {
            let im_bytes = match fs::read(&photo_path) {
                Ok(im_bytes) => {im_bytes}
                Err(e) => {
                    warn!("skipping unreadable photo {:?}: {e}", photo_path);
                    continue;
                }
            };

            let result = match self.recognition_pipeline.extract(&im_bytes, None, Some(true)) {
                Ok(result) => {result}
                Err(e) => {
                    warn!("skipping undecodable photo {:?}: {e}", photo_path);
                    continue;
                }
            };

            let facial_feature = match result.facial_feature {
                Some(facial_feature) => facial_feature,
                None => {
                    warn!("no usable face in stored photo {:?}", photo_path);
                    continue;
                }
            };

            let usn = uid_map.get(&name).cloned().unwrap_or_else(|| "PENDING".to_string());
            self.face_gallery.add(GalleryEntry {
                name: name.clone(),
                usn,
                embedding: facial_feature,
            });
            loaded += 1;
        }

        Ok(loaded)
    }
}

/// Student names key both filenames and ledger rows: lowercase them and keep
/// only filesystem-safe characters.
fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}
