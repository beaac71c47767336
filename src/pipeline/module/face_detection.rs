use anyhow::Error;
use image::RgbImage;
use ndarray::Array2;
use crate::pipeline::processing::nms::nms;

/// Model-free face detector: skin-chroma segmentation on a subsampled grid,
/// connected-component extraction, then NMS over the candidate boxes.
#[derive(Debug, Clone)]
pub struct SkinRegionDetection {
    cb_range: (f32, f32),
    cr_range: (f32, f32),
    grid_step: u32,
    minimum_region_ratio: f32,
    minimum_fill_ratio: f32,
    aspect_ratio_range: (f32, f32),
    iou_threshold: f32,
}

impl SkinRegionDetection {
    pub fn new(
        cb_range: (f32, f32),
        cr_range: (f32, f32),
        grid_step: u32,
        minimum_region_ratio: f32,
        minimum_fill_ratio: f32,
        aspect_ratio_range: (f32, f32),
        iou_threshold: f32,
    ) -> Self {
        SkinRegionDetection {
            cb_range,
            cr_range,
            grid_step,
            minimum_region_ratio,
            minimum_fill_ratio,
            aspect_ratio_range,
            iou_threshold,
        }
    }

    fn is_skin(&self, r: f32, g: f32, b: f32) -> bool {
        let cb = 128.0 - 0.168736 * r - 0.331264 * g + 0.5 * b;
        let cr = 128.0 + 0.5 * r - 0.418688 * g - 0.081312 * b;

        cb >= self.cb_range.0 && cb <= self.cb_range.1 && cr >= self.cr_range.0 && cr <= self.cr_range.1
    }

    fn skin_mask(&self, img: &RgbImage) -> Array2<bool> {
        let step = self.grid_step.max(1);
        let grid_w = (img.width() / step).max(1) as usize;
        let grid_h = (img.height() / step).max(1) as usize;

        Array2::from_shape_fn((grid_h, grid_w), |(gy, gx)| {
            let x = (gx as u32 * step).min(img.width() - 1);
            let y = (gy as u32 * step).min(img.height() - 1);
            let [r, g, b] = img.get_pixel(x, y).0;
            self.is_skin(r as f32, g as f32, b as f32)
        })
    }

    // Flood-fill over the 4-connected grid, one candidate box per component.
    fn extract_regions(&self, mask: &Array2<bool>) -> Vec<(usize, usize, usize, usize, usize)> {
        let (grid_h, grid_w) = mask.dim();
        let mut visited = Array2::<bool>::from_elem((grid_h, grid_w), false);
        let mut regions = Vec::new();

        for sy in 0..grid_h {
            for sx in 0..grid_w {
                if !mask[[sy, sx]] || visited[[sy, sx]] {
                    continue;
                }

                let mut stack = vec![(sy, sx)];
                visited[[sy, sx]] = true;
                let (mut min_x, mut min_y, mut max_x, mut max_y) = (sx, sy, sx, sy);
                let mut cells = 0usize;

                while let Some((cy, cx)) = stack.pop() {
                    cells += 1;
                    min_x = min_x.min(cx);
                    max_x = max_x.max(cx);
                    min_y = min_y.min(cy);
                    max_y = max_y.max(cy);

                    let mut neighbors = Vec::with_capacity(4);
                    if cy > 0 { neighbors.push((cy - 1, cx)); }
                    if cy + 1 < grid_h { neighbors.push((cy + 1, cx)); }
                    if cx > 0 { neighbors.push((cy, cx - 1)); }
                    if cx + 1 < grid_w { neighbors.push((cy, cx + 1)); }

                    for (ny, nx) in neighbors {
                        if mask[[ny, nx]] && !visited[[ny, nx]] {
                            visited[[ny, nx]] = true;
                            stack.push((ny, nx));
                        }
                    }
                }

                regions.push((min_x, min_y, max_x, max_y, cells));
            }
        }

        regions
    }

    /// Returns `[x1, y1, x2, y2, score]` rows in original image coordinates,
    /// highest score first. No candidate faces yields a `(0, 5)` array.
    pub fn call(&self, img: &RgbImage) -> Result<Array2<f32>, Error> {
        if img.width() == 0 || img.height() == 0 {
            return Err(Error::msg("face_detection - input image is empty"));
        }

        let mask = self.skin_mask(img);
        let (grid_h, grid_w) = mask.dim();
        let grid_cells = (grid_h * grid_w) as f32;
        let step = self.grid_step.max(1) as f32;

        let mut proposals: Vec<[f32; 5]> = Vec::new();
        for (min_x, min_y, max_x, max_y, cells) in self.extract_regions(&mask) {
            if (cells as f32) < self.minimum_region_ratio * grid_cells {
                continue;
            }

            let box_w = (max_x - min_x + 1) as f32;
            let box_h = (max_y - min_y + 1) as f32;
            let fill = cells as f32 / (box_w * box_h);
            if fill < self.minimum_fill_ratio {
                continue;
            }

            let aspect = box_w / box_h;
            if aspect < self.aspect_ratio_range.0 || aspect > self.aspect_ratio_range.1 {
                continue;
            }

            proposals.push([
                min_x as f32 * step,
                min_y as f32 * step,
                (max_x as f32 + 1.0) * step,
                (max_y as f32 + 1.0) * step,
                fill.min(1.0),
            ]);
        }

        if proposals.is_empty() {
            return Ok(Array2::<f32>::zeros((0, 5)));
        }

        let flat: Vec<f32> = proposals.iter().flatten().copied().collect();
        let dets = match Array2::from_shape_vec((proposals.len(), 5), flat) {
            Ok(dets) => {dets}
            Err(e) => {
                return Err(Error::from(e))
            }
        };

        let keep = nms(&dets, self.iou_threshold);
        let mut kept = Array2::<f32>::zeros((keep.len(), 5));
        for (row, &idx) in keep.iter().enumerate() {
            kept.row_mut(row).assign(&dets.row(idx));
        }

        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use crate::pipeline::model_config::config::FaceDetectionConfig;
    use super::*;

    fn detector() -> SkinRegionDetection {
        let cfg = FaceDetectionConfig::new();
        SkinRegionDetection::new(
            cfg.cb_range,
            cfg.cr_range,
            cfg.grid_step,
            cfg.minimum_region_ratio,
            cfg.minimum_fill_ratio,
            cfg.aspect_ratio_range,
            cfg.iou_threshold,
        )
    }

    const SKIN: Rgb<u8> = Rgb([200, 140, 110]);
    const BACKGROUND: Rgb<u8> = Rgb([20, 20, 200]);

    fn frame_with_face(x1: u32, y1: u32, x2: u32, y2: u32) -> RgbImage {
        RgbImage::from_fn(128, 128, |x, y| {
            if x >= x1 && x < x2 && y >= y1 && y < y2 {
                SKIN
            } else {
                BACKGROUND
            }
        })
    }

    #[test]
    fn test_detects_single_face_region() {
        let img = frame_with_face(32, 32, 96, 96);
        let dets = detector().call(&img).unwrap();

        assert_eq!(dets.nrows(), 1);
        let (x1, y1, x2, y2) = (dets[[0, 0]], dets[[0, 1]], dets[[0, 2]], dets[[0, 3]]);
        assert!(x1 <= 36.0 && x2 >= 92.0, "box {x1}..{x2}");
        assert!(y1 <= 36.0 && y2 >= 92.0, "box {y1}..{y2}");
        assert!(dets[[0, 4]] > 0.5);
    }

    #[test]
    fn test_no_face_in_background_only_frame() {
        let img = RgbImage::from_pixel(128, 128, BACKGROUND);
        let dets = detector().call(&img).unwrap();
        assert_eq!(dets.nrows(), 0);
    }

    #[test]
    fn test_detects_two_separated_faces() {
        let mut img = RgbImage::from_pixel(128, 128, BACKGROUND);
        for (x1, y1, x2, y2) in [(8u32, 24u32, 48u32, 72u32), (80, 24, 120, 72)] {
            for y in y1..y2 {
                for x in x1..x2 {
                    img.put_pixel(x, y, SKIN);
                }
            }
        }

        let dets = detector().call(&img).unwrap();
        assert_eq!(dets.nrows(), 2);
    }

    #[test]
    fn test_tiny_region_is_ignored() {
        let img = frame_with_face(60, 60, 66, 66);
        let dets = detector().call(&img).unwrap();
        assert_eq!(dets.nrows(), 0);
    }
}
