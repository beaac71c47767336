use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FaceQualityClass {
    Bad = 0,
    Good = 1,
    TooDark = 2,
    Blurred = 3,
}

pub fn match_face_quality(q: usize) -> FaceQualityClass {
    match q {
        0 => FaceQualityClass::Bad,
        1 => FaceQualityClass::Good,
        2 => FaceQualityClass::TooDark,
        3 => FaceQualityClass::Blurred,
        _ => FaceQualityClass::Bad,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FaceAntiSpoofingClass {
    Fake = 0,
    Real = 1,
}

pub fn match_face_anti_spoofing(q: usize) -> FaceAntiSpoofingClass {
    match q {
        0 => FaceAntiSpoofingClass::Fake,
        1 => FaceAntiSpoofingClass::Real,
        _ => FaceAntiSpoofingClass::Real,
    }
}

#[derive(Debug)]
pub struct FaceDetectionConfig {
    // Chroma bounds for skin segmentation, Cb then Cr.
    pub cb_range: (f32, f32),
    pub cr_range: (f32, f32),
    pub grid_step: u32,
    pub minimum_region_ratio: f32,
    pub minimum_fill_ratio: f32,
    pub aspect_ratio_range: (f32, f32),
    pub iou_threshold: f32,
}

impl FaceDetectionConfig {
    pub fn new() -> Self {
        FaceDetectionConfig {
            cb_range: (77.0, 127.0),
            cr_range: (133.0, 173.0),
            grid_step: 4,
            minimum_region_ratio: 0.005,
            minimum_fill_ratio: 0.35,
            aspect_ratio_range: (0.4, 1.6),
            iou_threshold: 0.45,
        }
    }
}

#[derive(Debug)]
pub struct FaceSelectionConfig {
    pub margin_center_left_ratio: f32,
    pub margin_center_right_ratio: f32,
    pub margin_edge_ratio: f32,
    pub minimum_face_ratio: f32,
    pub minimum_width_ratio: f32,
}

impl FaceSelectionConfig {
    pub fn new() -> Self {
        FaceSelectionConfig {
            margin_center_left_ratio: 0.3,
            margin_center_right_ratio: 0.3,
            margin_edge_ratio: 0.1,
            minimum_face_ratio: 0.0075,
            minimum_width_ratio: 0.25,
        }
    }
}

#[derive(Debug)]
pub struct FaceAlignmentConfig {
    pub image_size: (u32, u32),
    pub margin_ratio: f32,
}

impl FaceAlignmentConfig {
    pub fn new() -> Self {
        FaceAlignmentConfig {
            image_size: (112, 112),
            margin_ratio: 0.12,
        }
    }
}

#[derive(Debug)]
pub struct FaceQualityConfig {
    pub brightness_range: (f32, f32),
    pub sharpness_threshold: f32,
}

impl FaceQualityConfig {
    pub fn new() -> Self {
        FaceQualityConfig {
            brightness_range: (40.0, 220.0),
            sharpness_threshold: 12.0,
        }
    }
}

#[derive(Debug)]
pub struct FaceAntiSpoofingConfig {
    pub scales: Vec<f32>,
    pub weights: Vec<f32>,
    pub image_size: (u32, u32),
    pub threshold: f32,
}

impl FaceAntiSpoofingConfig {
    pub fn new() -> Self {
        FaceAntiSpoofingConfig {
            scales: vec![1.0, 1.8, 2.7],
            weights: vec![0.5, 0.3, 0.2],
            image_size: (80, 80),
            threshold: 0.55,
        }
    }
}

#[derive(Debug)]
pub struct FaceEmbeddingConfig {
    pub grid_size: (u32, u32),
}

impl FaceEmbeddingConfig {
    pub fn new() -> Self {
        FaceEmbeddingConfig {
            grid_size: (16, 16),
        }
    }
}

#[derive(Debug)]
pub struct FaceMatchingConfig {
    // Cosine distance, lower is stricter.
    pub distance_threshold: f32,
}

impl FaceMatchingConfig {
    pub fn new() -> Self {
        FaceMatchingConfig {
            distance_threshold: 0.50,
        }
    }
}
