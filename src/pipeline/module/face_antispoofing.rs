use std::collections::HashSet;
use anyhow::Error;
use image::RgbImage;
use ndarray::Array1;
use crate::pipeline::model_config::config::FaceAntiSpoofingClass;
use crate::pipeline::utils::image::{crop_region, resize_rgb, rgb_to_gray_array};
use crate::pipeline::utils::utils::laplacian_variance;

// Full liveness credit at this much Laplacian energy.
const TEXTURE_SATURATION: f32 = 300.0;
// Full liveness credit at this many distinct quantized colors.
const COLOR_SATURATION: f32 = 64.0;

/// Liveness check over multi-scale crops of the selected face box. Print and
/// replay attacks lose high-frequency texture and chromatic diversity, which
/// pulls the fused score under the threshold.
#[derive(Debug, Clone)]
pub struct FaceAntiSpoofing {
    scales: Vec<f32>,
    weights: Vec<f32>,
    image_size: (u32, u32),
    threshold: f32,
}

impl FaceAntiSpoofing {
    pub fn new(
        scales: Vec<f32>,
        weights: Vec<f32>,
        image_size: (u32, u32),
        threshold: f32,
    ) -> Result<Self, Error> {
        if scales.is_empty() || scales.len() != weights.len() {
            return Err(Error::msg("face_anti_spoofing - scales and weights must align"));
        }

        Ok(FaceAntiSpoofing {
            scales,
            weights,
            image_size,
            threshold,
        })
    }

    fn scale_crop(&self, img: &RgbImage, face_box: &Array1<f32>, scale: f32) -> Result<RgbImage, Error> {
        let (xmin, ymin, xmax, ymax) = (face_box[0], face_box[1], face_box[2], face_box[3]);
        let cx = (xmin + xmax) / 2.0;
        let cy = (ymin + ymax) / 2.0;
        let half_w = (xmax - xmin) * scale / 2.0;
        let half_h = (ymax - ymin) * scale / 2.0;

        let crop = match crop_region(img, cx - half_w, cy - half_h, cx + half_w, cy + half_h) {
            Ok(crop) => {crop}
            Err(e) => {
                return Err(Error::from(e))
            }
        };

        Ok(resize_rgb(&crop, self.image_size.0, self.image_size.1))
    }

    fn liveness_score(&self, crop: &RgbImage) -> f32 {
        let gray = rgb_to_gray_array(crop);
        let texture = (laplacian_variance(&gray) / TEXTURE_SATURATION).min(1.0);

        // 5-bit quantization per channel keeps sensor noise from inflating
        // the color count.
        let mut colors: HashSet<(u8, u8, u8)> = HashSet::new();
        for pixel in crop.pixels() {
            let [r, g, b] = pixel.0;
            colors.insert((r >> 3, g >> 3, b >> 3));
        }
        let diversity = (colors.len() as f32 / COLOR_SATURATION).min(1.0);

        0.6 * texture + 0.4 * diversity
    }

    /// Returns the fused liveness score and the verdict.
    pub fn call(&self, img: &RgbImage, face_box: &Array1<f32>) -> Result<(f32, FaceAntiSpoofingClass), Error> {
        if face_box.len() < 4 {
            return Err(Error::msg("face_anti_spoofing - face box must have 4 coordinates"));
        }

        let weight_sum: f32 = self.weights.iter().sum();
        let mut fused = 0.0;

        for (scale, weight) in self.scales.iter().zip(self.weights.iter()) {
            let crop = match self.scale_crop(img, face_box, *scale) {
                Ok(crop) => {crop}
                Err(e) => {
                    return Err(Error::from(e))
                }
            };
            fused += weight * self.liveness_score(&crop);
        }
        fused /= weight_sum;

        let class = if fused >= self.threshold {
            FaceAntiSpoofingClass::Real
        } else {
            FaceAntiSpoofingClass::Fake
        };

        Ok((fused, class))
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use ndarray::arr1;
    use crate::pipeline::model_config::config::FaceAntiSpoofingConfig;
    use super::*;

    fn antispoofing() -> FaceAntiSpoofing {
        let cfg = FaceAntiSpoofingConfig::new();
        FaceAntiSpoofing::new(cfg.scales, cfg.weights, cfg.image_size, cfg.threshold).unwrap()
    }

    #[test]
    fn test_flat_print_like_crop_is_fake() {
        let img = RgbImage::from_pixel(256, 256, Rgb([180, 140, 120]));
        let (score, class) = antispoofing().call(&img, &arr1(&[64.0, 64.0, 192.0, 192.0, 0.9])).unwrap();
        assert_eq!(class, FaceAntiSpoofingClass::Fake);
        assert!(score < 0.2, "score was {score}");
    }

    #[test]
    fn test_textured_colorful_crop_is_real() {
        let img = RgbImage::from_fn(256, 256, |x, y| {
            Rgb([
                ((x * 37 + y * 91) % 256) as u8,
                ((x * 53 + y * 29) % 256) as u8,
                ((x * 17 + y * 71) % 256) as u8,
            ])
        });
        let (score, class) = antispoofing().call(&img, &arr1(&[64.0, 64.0, 192.0, 192.0, 0.9])).unwrap();
        assert_eq!(class, FaceAntiSpoofingClass::Real);
        assert!(score > 0.55, "score was {score}");
    }

    #[test]
    fn test_mismatched_scales_and_weights() {
        assert!(FaceAntiSpoofing::new(vec![1.0, 2.0], vec![1.0], (80, 80), 0.5).is_err());
    }
}
