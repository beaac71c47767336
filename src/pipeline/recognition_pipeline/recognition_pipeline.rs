use anyhow::Error;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use crate::pipeline::model_config::config::{FaceAlignmentConfig, FaceAntiSpoofingClass, FaceAntiSpoofingConfig, FaceDetectionConfig, FaceEmbeddingConfig, FaceQualityClass, FaceQualityConfig, FaceSelectionConfig};
use crate::pipeline::module::face_alignment::FaceAlignment;
use crate::pipeline::module::face_antispoofing::FaceAntiSpoofing;
use crate::pipeline::module::face_detection::SkinRegionDetection;
use crate::pipeline::module::face_embedding::FaceEmbedding;
use crate::pipeline::module::face_quality::FaceQuality;
use crate::pipeline::module::face_selection::FaceSelection;
use crate::pipeline::utils::image::byte_data_to_rgb;

#[derive(Clone)]
pub struct RecognitionPipeline {
    face_detection: SkinRegionDetection,
    face_selection: FaceSelection,
    face_alignment: FaceAlignment,
    face_quality: FaceQuality,
    face_anti_spoofing: FaceAntiSpoofing,
    face_embedding: FaceEmbedding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionExtractionResult {
    pub face_count: i32,
    pub facial_feature: Option<Array1<f32>>,
    pub face_quality: Option<FaceQualityClass>,
    pub quality_score: Option<f32>,
    pub spoofing_check: Option<FaceAntiSpoofingClass>,
    pub liveness_score: Option<f32>,
}

impl RecognitionExtractionResult {
    fn new() -> RecognitionExtractionResult {
        RecognitionExtractionResult {
            face_count: 0,
            facial_feature: None,
            face_quality: None,
            quality_score: None,
            spoofing_check: None,
            liveness_score: None,
        }
    }
}

impl RecognitionPipeline {
    pub fn new() -> Result<Self, Error> {
        // Init stage config
        let face_detection_cfg = FaceDetectionConfig::new();
        let face_selection_cfg = FaceSelectionConfig::new();
        let face_align_cfg = FaceAlignmentConfig::new();
        let face_quality_cfg = FaceQualityConfig::new();
        let face_anti_spoofing_cfg = FaceAntiSpoofingConfig::new();
        let face_embedding_cfg = FaceEmbeddingConfig::new();

        let face_detection = SkinRegionDetection::new(
            face_detection_cfg.cb_range,
            face_detection_cfg.cr_range,
            face_detection_cfg.grid_step,
            face_detection_cfg.minimum_region_ratio,
            face_detection_cfg.minimum_fill_ratio,
            face_detection_cfg.aspect_ratio_range,
            face_detection_cfg.iou_threshold,
        );

        let face_selection = FaceSelection::new(
            face_selection_cfg.margin_center_left_ratio,
            face_selection_cfg.margin_center_right_ratio,
            face_selection_cfg.margin_edge_ratio,
            face_selection_cfg.minimum_face_ratio,
            face_selection_cfg.minimum_width_ratio,
        );

        let face_alignment = FaceAlignment::new(
            face_align_cfg.image_size,
            face_align_cfg.margin_ratio,
        );

        let face_quality = FaceQuality::new(
            face_quality_cfg.brightness_range,
            face_quality_cfg.sharpness_threshold,
        );

        let face_anti_spoofing = match FaceAntiSpoofing::new(
            face_anti_spoofing_cfg.scales,
            face_anti_spoofing_cfg.weights,
            face_anti_spoofing_cfg.image_size,
            face_anti_spoofing_cfg.threshold,
        ) {
            Ok(face_anti_spoofing) => {face_anti_spoofing}
            Err(e) => {
                return Err(Error::from(e))
            }
        };

        let face_embedding = FaceEmbedding::new(face_embedding_cfg.grid_size);

        Ok(RecognitionPipeline {
            face_detection,
            face_selection,
            face_alignment,
            face_quality,
            face_anti_spoofing,
            face_embedding,
        })
    }

    pub fn embedding_len(&self) -> usize {
        self.face_embedding.embedding_len()
    }

    /// Runs detect -> select -> (anti-spoof) -> align -> quality -> embed.
    /// Enrollment only embeds a `Good` face; check-in embeds anything that
    /// is not outright `Bad`.
    pub fn extract(&self, im_bytes: &[u8], is_spoofing_check: Option<bool>, is_enroll: Option<bool>) -> Result<RecognitionExtractionResult, Error> {
        let mut extraction_result = RecognitionExtractionResult::new();

        let spoofing_check = is_spoofing_check.unwrap_or(false);
        let enroll = is_enroll.unwrap_or(false);

        let image = match byte_data_to_rgb(im_bytes) {
            Ok(image) => {image}
            Err(e) => {
                return Err(Error::from(e))
            }
        };

        let detections = match self.face_detection.call(&image) {
            Ok(detections) => {detections}
            Err(e) => {
                return Err(Error::from(e))
            }
        };

        extraction_result.face_count = detections.nrows() as i32;

        let selected_face_box = match self.face_selection.call(image.dimensions(), &detections, is_enroll) {
            Ok(selected_face_box) => {selected_face_box}
            Err(e) => {
                return Err(Error::from(e))
            }
        };

        let selected_face_box: Array1<f32> = match selected_face_box {
            Some(selected_face_box) => selected_face_box,
            None => return Ok(extraction_result),
        };

        if spoofing_check {
            let (liveness_score, spoofing_class) = match self.face_anti_spoofing.call(&image, &selected_face_box) {
                Ok((liveness_score, spoofing_class)) => {(liveness_score, spoofing_class)}
                Err(e) => {
                    return Err(Error::from(e))
                }
            };
            extraction_result.liveness_score = Some(liveness_score);
            extraction_result.spoofing_check = Some(spoofing_class);
        }

        let aligned_face_image = match self.face_alignment.call(&image, &selected_face_box) {
            Ok(aligned_face_image) => {aligned_face_image}
            Err(e) => {
                return Err(Error::from(e))
            }
        };

        let (quality_score, quality_class) = match self.face_quality.call(&aligned_face_image) {
            Ok((quality_score, quality_class)) => {(quality_score, quality_class)}
            Err(e) => {
                return Err(Error::from(e))
            }
        };
        extraction_result.quality_score = Some(quality_score);
        extraction_result.face_quality = Some(quality_class.clone());

        let embeddable = if enroll {
            quality_class == FaceQualityClass::Good
        } else {
            quality_class != FaceQualityClass::Bad
        };

        if embeddable {
            let facial_feature = match self.face_embedding.call(&aligned_face_image) {
                Ok(facial_feature) => {facial_feature}
                Err(e) => {
                    return Err(Error::from(e))
                }
            };
            extraction_result.facial_feature = Some(facial_feature);
        }

        Ok(extraction_result)
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use super::*;

    // Gray offsets leave YCbCr chroma untouched, so the textured patch still
    // segments as skin.
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
        encode_png(&img)
    }

    fn encode_png(img: &RgbImage) -> Vec<u8> {
        let mut bytes: Vec<u8> = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_checkin_extracts_feature() {
        let pipeline = RecognitionPipeline::new().unwrap();
        let result = pipeline.extract(&synthetic_face_frame(), Some(true), Some(false)).unwrap();

        assert_eq!(result.face_count, 1);
        assert!(result.spoofing_check.is_some());
        assert!(result.liveness_score.is_some());
        assert!(result.face_quality.is_some());
        let feature = result.facial_feature.expect("feature should be extracted");
        assert_eq!(feature.len(), pipeline.embedding_len());
    }

    #[test]
    fn test_enroll_extracts_feature_for_dominant_face() {
        let pipeline = RecognitionPipeline::new().unwrap();
        let result = pipeline.extract(&synthetic_face_frame(), None, Some(true)).unwrap();

        assert_eq!(result.face_count, 1);
        assert_eq!(result.face_quality, Some(FaceQualityClass::Good));
        assert!(result.facial_feature.is_some());
        // Spoof check was not requested.
        assert!(result.spoofing_check.is_none());
    }

    #[test]
    fn test_frame_without_face() {
        let pipeline = RecognitionPipeline::new().unwrap();
        let empty = encode_png(&RgbImage::from_pixel(128, 128, Rgb([20, 20, 200])));
        let result = pipeline.extract(&empty, Some(true), None).unwrap();

        assert_eq!(result.face_count, 0);
        assert!(result.facial_feature.is_none());
        assert!(result.spoofing_check.is_none());
    }

    #[test]
    fn test_undecodable_bytes_error() {
        let pipeline = RecognitionPipeline::new().unwrap();
        assert!(pipeline.extract(&[1u8, 2, 3], None, None).is_err());
    }
}
