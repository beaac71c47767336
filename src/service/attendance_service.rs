use std::sync::Arc;
use anyhow::Error;
use log::{error, info, warn};
use crate::geofence::geofence::Geofence;
use crate::models::attendance_model::{AttendanceCheckinInput, AttendanceCheckinResultOutput};
use crate::pipeline::model_config::config::{FaceAntiSpoofingClass, FaceMatchingConfig};
use crate::pipeline::module::face_matching::FaceMatching;
use crate::pipeline::recognition_pipeline::recognition_pipeline::RecognitionPipeline;
use crate::repository::attendance_repo::{AttendanceRecord, AttendanceRepository, MarkOutcome};
use crate::repository::face_gallery::FaceGallery;

#[derive(Clone)]
pub struct AttendanceService {
    recognition_pipeline: Arc<RecognitionPipeline>,
    face_matching: FaceMatching,
    geofence: Geofence,
    face_gallery: Arc<FaceGallery>,
    attendance_repository: Arc<AttendanceRepository>,
}

impl AttendanceService {
    pub fn new(
        recognition_pipeline: &Arc<RecognitionPipeline>,
        face_gallery: &Arc<FaceGallery>,
        attendance_repository: &Arc<AttendanceRepository>,
        geofence: Geofence,
    ) -> Self {
        let face_matching_cfg = FaceMatchingConfig::new();

        AttendanceService {
            recognition_pipeline: Arc::clone(recognition_pipeline),
            face_matching: FaceMatching::new(face_matching_cfg.distance_threshold),
            geofence,
            face_gallery: Arc::clone(face_gallery),
            attendance_repository: Arc::clone(attendance_repository),
        }
    }

    pub fn allowed_radius_m(&self) -> f64 {
        self.geofence.allowed_radius_m()
    }

    /// Geofence gate, then recognition, then the ledger. A check-in outside
    /// the fence never reaches the face pipeline; a spoofed face is never
    /// marked.
    pub async fn check_in(&self, input: AttendanceCheckinInput) -> Result<AttendanceCheckinResultOutput, Error> {
        let mut output = AttendanceCheckinResultOutput::default();

        let fence = self.geofence.check(input.latitude, input.longitude);
        output.distance_m = fence.distance_m;
        output.geofence_allowed = fence.allowed;
        if !fence.allowed {
            info!("check-in rejected by geofence at {:.0}m", fence.distance_m);
            return Ok(output);
        }

        let pipeline = Arc::clone(&self.recognition_pipeline);
        let im_bytes = input.im_bytes.clone();
        let spoofing_check = Some(input.spoofing_check.unwrap_or(true));
        let result = tokio::task::spawn_blocking(move || {
            pipeline.extract(&im_bytes, spoofing_check, Some(false))
        })
        .await?;
        let result = match result {
            Ok(result) => {result}
            Err(e) => {
                error!("failed to extract face: {e}");
                return Err(e)
            }
        };

        output.face_count = result.face_count;
        output.spoofing_check = result.spoofing_check.clone();
        output.face_quality = result.face_quality.clone();

        if result.spoofing_check == Some(FaceAntiSpoofingClass::Fake) {
            warn!("spoofed face rejected at check-in");
            return Ok(output);
        }

        let facial_feature = match result.facial_feature {
            Some(facial_feature) => facial_feature,
            None => return Ok(output),
        };

        let gallery = self.face_gallery.snapshot();
        let matched = match self.face_matching.call(&facial_feature, &gallery) {
            Some(matched) => matched,
            None => return Ok(output),
        };

        let mark_outcome = match self.attendance_repository.mark(&matched.name, &matched.usn) {
            Ok(mark_outcome) => {mark_outcome}
            Err(e) => {
                error!("failed to write attendance ledger: {e}");
                return Err(e)
            }
        };

        output.identity = Some(matched.name);
        output.usn = Some(matched.usn);
        output.match_distance = Some(matched.distance);
        output.attendance_marked = mark_outcome == MarkOutcome::Marked;
        output.already_marked = mark_outcome == MarkOutcome::AlreadyMarked;

        Ok(output)
    }

    pub fn list_records(&self, offset: u64, limit: u32) -> Result<(Vec<AttendanceRecord>, u64), Error> {
        self.attendance_repository.list(offset, limit)
    }

    pub fn export_csv(&self) -> Result<String, Error> {
        self.attendance_repository.export_csv()
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use crate::pipeline::module::face_matching::GalleryEntry;
    use super::*;

    fn service(geofence: Geofence) -> (tempfile::TempDir, AttendanceService) {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Arc::new(RecognitionPipeline::new().unwrap());
        let gallery = Arc::new(FaceGallery::new());
        let repo = Arc::new(AttendanceRepository::new(dir.path().join("attendance.csv")).unwrap());
        (dir, AttendanceService::new(&pipeline, &gallery, &repo, geofence))
    }

    fn synthetic_face_frame() -> Vec<u8> {
        let img = RgbImage::from_fn(128, 128, |x, y| {
            if x >= 24 && x < 104 && y >= 24 && y < 104 {
                let delta = (((x * 3 + y * 5) % 24) as i32 - 12) as i16;
                Rgb([
                    (200i16 + delta).clamp(0, 255) as u8,
                    (140i16 + delta).clamp(0, 255) as u8,
                    (110i16 + delta).clamp(0, 255) as u8,
                ])
            } else {
                Rgb([20, 20, 200])
            }
        });
        let mut bytes: Vec<u8> = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[tokio::test]
    async fn test_geofence_blocks_pipeline() {
        let (_dir, service) = service(Geofence::new(15.696969, 74.696060, 50.0));

        let output = service
            .check_in(AttendanceCheckinInput {
                im_bytes: bytes::Bytes::from_static(b"not an image"),
                latitude: 16.0,
                longitude: 74.696060,
                spoofing_check: None,
            })
            .await
            .unwrap();

        // The invalid image bytes were never decoded.
        assert!(!output.geofence_allowed);
        assert!(output.distance_m > 50.0);
        assert_eq!(output.face_count, 0);
    }

    #[tokio::test]
    async fn test_checkin_marks_recognized_student() {
        let (_dir, service) = service(Geofence::new(15.696969, 74.696060, 50.0));
        let frame = synthetic_face_frame();

        // Enroll the same frame's embedding so the probe is an exact match.
        let enrolled = service
            .recognition_pipeline
            .extract(&frame, None, Some(true))
            .unwrap()
            .facial_feature
            .unwrap();
        service.face_gallery.add(GalleryEntry {
            name: "arun".to_string(),
            usn: "2GI001".to_string(),
            embedding: enrolled,
        });

        let input = AttendanceCheckinInput {
            im_bytes: bytes::Bytes::from(frame),
            latitude: 15.696969,
            longitude: 74.696060,
            spoofing_check: Some(false),
        };

        let output = service.check_in(input.clone()).await.unwrap();
        assert!(output.geofence_allowed);
        assert_eq!(output.identity.as_deref(), Some("arun"));
        assert!(output.attendance_marked);
        assert!(!output.already_marked);

        // Same student, same day: reported but not re-marked.
        let output = service.check_in(input).await.unwrap();
        assert!(output.already_marked);
        assert!(!output.attendance_marked);

        let (_, total) = service.list_records(0, 10).unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_spoofed_face_is_never_marked() {
        let (_dir, service) = service(Geofence::new(15.696969, 74.696060, 50.0));

        // A flat, texture-free skin patch reads as a printed photo.
        let img = RgbImage::from_fn(128, 128, |x, y| {
            if x >= 24 && x < 104 && y >= 24 && y < 104 {
                Rgb([200, 140, 110])
            } else {
                Rgb([20, 20, 200])
            }
        });
        let mut frame: Vec<u8> = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut frame), image::ImageFormat::Png)
            .unwrap();

        // Even an enrolled identity must not be marked from a spoofed frame.
        let enrolled = service
            .recognition_pipeline
            .extract(&frame, None, Some(true))
            .unwrap();
        if let Some(embedding) = enrolled.facial_feature {
            service.face_gallery.add(GalleryEntry {
                name: "arun".to_string(),
                usn: "2GI001".to_string(),
                embedding,
            });
        }

        let output = service
            .check_in(AttendanceCheckinInput {
                im_bytes: bytes::Bytes::from(frame),
                latitude: 15.696969,
                longitude: 74.696060,
                spoofing_check: Some(true),
            })
            .await
            .unwrap();

        assert_eq!(output.spoofing_check, Some(FaceAntiSpoofingClass::Fake));
        assert!(!output.attendance_marked);
        assert!(output.identity.is_none());

        let (_, total) = service.list_records(0, 10).unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_unknown_face_is_not_marked() {
        let (_dir, service) = service(Geofence::new(15.696969, 74.696060, 50.0));

        let output = service
            .check_in(AttendanceCheckinInput {
                im_bytes: bytes::Bytes::from(synthetic_face_frame()),
                latitude: 15.696969,
                longitude: 74.696060,
                spoofing_check: Some(false),
            })
            .await
            .unwrap();

        assert_eq!(output.face_count, 1);
        assert!(output.identity.is_none());
        assert!(!output.attendance_marked);
    }
}
