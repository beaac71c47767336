use anyhow::Error;
use image::RgbImage;
use ndarray::Array1;
use crate::pipeline::utils::image::{crop_region, resize_rgb};

/// Margin-expanded crop of the selected box, resized to the canonical face
/// resolution the downstream stages expect.
#[derive(Debug, Clone)]
pub struct FaceAlignment {
    image_size: (u32, u32),
    margin_ratio: f32,
}

impl FaceAlignment {
    pub fn new(image_size: (u32, u32), margin_ratio: f32) -> Self {
        FaceAlignment {
            image_size,
            margin_ratio,
        }
    }

    pub fn call(&self, img: &RgbImage, face_box: &Array1<f32>) -> Result<RgbImage, Error> {
        if face_box.len() < 4 {
            return Err(Error::msg("face_alignment - face box must have 4 coordinates"));
        }

        let (xmin, ymin, xmax, ymax) = (face_box[0], face_box[1], face_box[2], face_box[3]);
        let margin = self.margin_ratio * f32::max(xmax - xmin, ymax - ymin);

        let crop = match crop_region(img, xmin - margin, ymin - margin, xmax + margin, ymax + margin) {
            Ok(crop) => {crop}
            Err(e) => {
                return Err(Error::from(e))
            }
        };

        Ok(resize_rgb(&crop, self.image_size.0, self.image_size.1))
    }
}
