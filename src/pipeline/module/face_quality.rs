use anyhow::Error;
use image::RgbImage;
use crate::pipeline::model_config::config::FaceQualityClass;
use crate::pipeline::utils::image::rgb_to_gray_array;
use crate::pipeline::utils::utils::{laplacian_variance, mean_std};

#[derive(Debug, Clone)]
pub struct FaceQuality {
    brightness_range: (f32, f32),
    sharpness_threshold: f32,
}

impl FaceQuality {
    pub fn new(brightness_range: (f32, f32), sharpness_threshold: f32) -> Self {
        FaceQuality {
            brightness_range,
            sharpness_threshold,
        }
    }

    /// Returns the sharpness score alongside the classification. Brightness
    /// is checked before sharpness: exposure problems dominate.
    pub fn call(&self, aligned: &RgbImage) -> Result<(f32, FaceQualityClass), Error> {
        if aligned.width() == 0 || aligned.height() == 0 {
            return Err(Error::msg("face_quality - aligned face is empty"));
        }

        let gray = rgb_to_gray_array(aligned);
        let (brightness, _) = mean_std(&gray);
        let sharpness = laplacian_variance(&gray);

        if brightness < self.brightness_range.0 {
            return Ok((sharpness, FaceQualityClass::TooDark));
        }
        if brightness > self.brightness_range.1 {
            return Ok((sharpness, FaceQualityClass::Bad));
        }
        if sharpness < self.sharpness_threshold {
            return Ok((sharpness, FaceQualityClass::Blurred));
        }

        Ok((sharpness, FaceQualityClass::Good))
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use crate::pipeline::model_config::config::FaceQualityConfig;
    use super::*;

    fn quality() -> FaceQuality {
        let cfg = FaceQualityConfig::new();
        FaceQuality::new(cfg.brightness_range, cfg.sharpness_threshold)
    }

    fn textured_face(base: u8) -> RgbImage {
        RgbImage::from_fn(112, 112, |x, y| {
            let v = base.saturating_add((((x * 7 + y * 13) % 32) * 4) as u8);
            Rgb([v, v, v])
        })
    }

    #[test]
    fn test_dark_face() {
        let img = RgbImage::from_pixel(112, 112, Rgb([5, 5, 5]));
        let (_, class) = quality().call(&img).unwrap();
        assert_eq!(class, FaceQualityClass::TooDark);
    }

    #[test]
    fn test_overexposed_face() {
        let img = RgbImage::from_pixel(112, 112, Rgb([250, 250, 250]));
        let (_, class) = quality().call(&img).unwrap();
        assert_eq!(class, FaceQualityClass::Bad);
    }

    #[test]
    fn test_flat_face_is_blurred() {
        let img = RgbImage::from_pixel(112, 112, Rgb([120, 120, 120]));
        let (score, class) = quality().call(&img).unwrap();
        assert_eq!(class, FaceQualityClass::Blurred);
        assert!(score < 1.0);
    }

    #[test]
    fn test_textured_face_is_good() {
        let (score, class) = quality().call(&textured_face(60)).unwrap();
        assert_eq!(class, FaceQualityClass::Good, "score was {score}");
    }
}
