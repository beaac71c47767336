use anyhow::Error;
use image::RgbImage;
use ndarray::Array1;
use crate::pipeline::utils::image::{resize_rgb, rgb_to_gray_array};
use crate::pipeline::utils::utils::{l2_normalize, mean_std};

/// Normalized-intensity template embedding: the aligned face is reduced to a
/// small grayscale grid, made zero-mean/unit-variance to cancel illumination,
/// and L2-normalized so cosine distance is a dot product away.
#[derive(Debug, Clone)]
pub struct FaceEmbedding {
    grid_size: (u32, u32),
}

impl FaceEmbedding {
    pub fn new(grid_size: (u32, u32)) -> Self {
        FaceEmbedding {
            grid_size,
        }
    }

    pub fn embedding_len(&self) -> usize {
        (self.grid_size.0 * self.grid_size.1) as usize
    }

    pub fn call(&self, aligned: &RgbImage) -> Result<Array1<f32>, Error> {
        if aligned.width() == 0 || aligned.height() == 0 {
            return Err(Error::msg("face_embedding - aligned face is empty"));
        }

        let reduced = resize_rgb(aligned, self.grid_size.0, self.grid_size.1);
        let gray = rgb_to_gray_array(&reduced);
        let (mean, std) = mean_std(&gray);

        let flat: Vec<f32> = gray.iter().copied().collect();
        let mut feature = Array1::from(flat);

        // A featureless crop normalizes to the zero vector, which never
        // matches anything in the gallery.
        if std > f32::EPSILON {
            feature = feature.mapv(|v| (v - mean) / std);
        } else {
            feature = feature.mapv(|_| 0.0);
        }

        Ok(l2_normalize(&feature))
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use crate::pipeline::model_config::config::FaceEmbeddingConfig;
    use super::*;

    fn embedding() -> FaceEmbedding {
        FaceEmbedding::new(FaceEmbeddingConfig::new().grid_size)
    }

    fn gradient_face(seed: u32) -> RgbImage {
        RgbImage::from_fn(112, 112, |x, y| {
            let v = ((x * seed + y * 3) % 200) as u8;
            Rgb([v, v, v])
        })
    }

    #[test]
    fn test_embedding_is_unit_norm() {
        let feature = embedding().call(&gradient_face(5)).unwrap();
        assert_eq!(feature.len(), 256);
        let norm = feature.mapv(|x| x * x).sum().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_embedding_is_illumination_invariant() {
        let dark = embedding().call(&gradient_face(5)).unwrap();
        let bright = embedding()
            .call(&RgbImage::from_fn(112, 112, |x, y| {
                let v = (((x * 5 + y * 3) % 200) / 2 + 55) as u8;
                Rgb([v, v, v])
            }))
            .unwrap();

        // Same pattern under different gain/offset lands at the same place.
        let distance = 1.0 - dark.dot(&bright);
        assert!(distance < 0.05, "distance was {distance}");
    }

    #[test]
    fn test_flat_crop_embeds_to_zero() {
        let flat = RgbImage::from_pixel(112, 112, Rgb([77, 77, 77]));
        let feature = embedding().call(&flat).unwrap();
        assert!(feature.iter().all(|&v| v == 0.0));
    }
}
