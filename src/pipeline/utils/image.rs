use anyhow::Error;
use image::{imageops, DynamicImage, RgbImage};
use image::imageops::FilterType;
use ndarray::Array2;

/// Decode raw upload bytes into an RGB image. Alpha and grayscale sources are
/// converted to three channels.
pub fn byte_data_to_rgb(im_bytes: &[u8]) -> Result<RgbImage, Error> {
    let decoded: DynamicImage = match image::load_from_memory(im_bytes) {
        Ok(decoded) => decoded,
        Err(e) => {
            return Err(Error::from(e))
        }
    };

    Ok(decoded.to_rgb8())
}

pub fn rgb_to_gray_array(img: &RgbImage) -> Array2<f32> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let mut gray = Array2::<f32>::zeros((height, width));

    for (x, y, pixel) in img.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        gray[[y as usize, x as usize]] = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    }

    gray
}

/// Crop the region `[x1, y1, x2, y2)` clamped to the image bounds.
pub fn crop_region(img: &RgbImage, x1: f32, y1: f32, x2: f32, y2: f32) -> Result<RgbImage, Error> {
    let (width, height) = (img.width() as f32, img.height() as f32);

    let x1 = x1.max(0.0).min(width - 1.0);
    let y1 = y1.max(0.0).min(height - 1.0);
    let x2 = x2.max(x1 + 1.0).min(width);
    let y2 = y2.max(y1 + 1.0).min(height);

    let (w, h) = ((x2 - x1) as u32, (y2 - y1) as u32);
    if w == 0 || h == 0 {
        return Err(Error::msg("crop region is empty"));
    }

    Ok(imageops::crop_imm(img, x1 as u32, y1 as u32, w, h).to_image())
}

pub fn resize_rgb(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    imageops::resize(img, width, height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use image::Rgb;
    use super::*;

    #[test]
    fn test_byte_data_to_rgb() {
        let img = RgbImage::from_pixel(8, 8, Rgb([10, 20, 30]));
        let mut png_bytes: Vec<u8> = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut png_bytes), image::ImageFormat::Png)
            .unwrap();

        let decoded = byte_data_to_rgb(&png_bytes).unwrap();
        assert_eq!(decoded.dimensions(), (8, 8));
        assert_eq!(decoded.get_pixel(4, 4).0, [10, 20, 30]);
    }

    #[test]
    fn test_byte_data_to_rgb_rejects_garbage() {
        assert!(byte_data_to_rgb(&[0u8, 1, 2, 3]).is_err());
    }

    #[test]
    fn test_rgb_to_gray_array() {
        let img = RgbImage::from_pixel(4, 2, Rgb([255, 255, 255]));
        let gray = rgb_to_gray_array(&img);
        assert_eq!(gray.dim(), (2, 4));
        assert!((gray[[0, 0]] - 255.0).abs() < 0.5);
    }

    #[test]
    fn test_crop_region_clamps_to_bounds() {
        let img = RgbImage::from_pixel(10, 10, Rgb([1, 2, 3]));
        let crop = crop_region(&img, -5.0, -5.0, 50.0, 50.0).unwrap();
        assert_eq!(crop.dimensions(), (10, 10));

        let crop = crop_region(&img, 2.0, 2.0, 6.0, 8.0).unwrap();
        assert_eq!(crop.dimensions(), (4, 6));
    }
}
