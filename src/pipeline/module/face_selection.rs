use anyhow::Error;
use ndarray::{Array1, Array2};

#[derive(Debug, Clone)]
pub struct FaceSelection {
    margin_center_left_ratio: f32,
    margin_center_right_ratio: f32,
    margin_edge_ratio: f32,
    minimum_face_ratio: f32,
    minimum_width_ratio: f32,
}

impl FaceSelection {
    pub fn new(
        margin_center_left_ratio: f32,
        margin_center_right_ratio: f32,
        margin_edge_ratio: f32,
        minimum_face_ratio: f32,
        minimum_width_ratio: f32,
    ) -> Self {
        FaceSelection {
            margin_center_left_ratio,
            margin_center_right_ratio,
            margin_edge_ratio,
            minimum_face_ratio,
            minimum_width_ratio,
        }
    }

    fn get_biggest_area_face(&self, face_boxes: &Array2<f32>) -> Option<Array1<f32>> {
        let mut biggest_area: f32 = 0.0;
        let mut biggest_bbox: Option<Array1<f32>> = None;

        for bbox in face_boxes.outer_iter() {
            let (xmin, ymin, xmax, ymax) = (bbox[0], bbox[1], bbox[2], bbox[3]);
            if (xmax - xmin) * (ymax - ymin) > biggest_area {
                biggest_area = (xmax - xmin) * (ymax - ymin);
                biggest_bbox = Some(bbox.to_owned());
            }
        }
        biggest_bbox
    }

    fn is_face_area_big_enough(&self, image_width: f32, face_box: &Array1<f32>) -> bool {
        let face_width = face_box[2] - face_box[0];
        face_width / image_width > self.minimum_width_ratio
    }

    /// Picks the primary face box. Enrollment requires the biggest face to
    /// dominate the frame; check-in prefers centered boxes away from the
    /// frame edges, falling back to every candidate.
    pub fn call(&self, image_size: (u32, u32), face_boxes: &Array2<f32>, is_enroll: Option<bool>) -> Result<Option<Array1<f32>>, Error> {
        let enroll = is_enroll.unwrap_or(false);
        let (image_width, image_height) = (image_size.0 as f32, image_size.1 as f32);

        if image_width <= 0.0 || image_height <= 0.0 {
            return Err(Error::msg("face_selection - image has no extent"));
        }

        if enroll {
            let biggest_bbox = self.get_biggest_area_face(face_boxes);
            if let Some(_biggest_bbox) = &biggest_bbox {
                if self.is_face_area_big_enough(image_width, _biggest_bbox) {
                    return Ok(biggest_bbox);
                }
            }
            return Ok(None);
        }

        let margin_center_left = self.margin_center_left_ratio * image_width;
        let margin_center_right = self.margin_center_right_ratio * image_width;
        let mut margin_edge = self.margin_edge_ratio * image_width;
        margin_edge = f32::min(50.0, margin_edge);
        let x_cen = image_width / 2.0;

        let mut valid_boxes: Vec<Vec<f32>> = Vec::with_capacity(1);
        for detection in face_boxes.outer_iter() {
            let x_min = detection[0];
            let y_min = detection[1];
            let x_max = detection[2];
            let y_max = detection[3];
            let area = (x_max - x_min) * (y_max - y_min);
            let box_center_width = (x_min + x_max) / 2.0;
            let box_center_height = (y_min + y_max) / 2.0;
            if (box_center_width >= margin_edge)
                && (box_center_width <= image_width - margin_edge)
                && (box_center_height >= margin_edge)
                && (box_center_height <= image_height - margin_edge)
                && (area / (image_height * image_width) >= self.minimum_face_ratio)
            {
                valid_boxes.push(detection.to_vec());
            }
        }

        let mut center_boxes: Vec<Vec<f32>> = Vec::with_capacity(1);
        for result in valid_boxes.iter() {
            let box_center_width = (result[0] + result[2]) / 2.0;
            if -margin_center_left <= box_center_width - x_cen && box_center_width - x_cen <= margin_center_right {
                center_boxes.push(result.clone());
            }
        }

        if center_boxes.is_empty() {
            if valid_boxes.is_empty() {
                center_boxes = face_boxes.outer_iter().map(|row| row.to_vec()).collect()
            } else {
                center_boxes = valid_boxes
            }
        }

        let mut out_bbox: Option<Array1<f32>> = None;
        let mut max_size: f32 = 0.0;

        for result in center_boxes.iter() {
            let tem_size = (result[2] - result[0]) + (result[3] - result[1]);
            if tem_size > max_size {
                max_size = tem_size;
                out_bbox = Some(<Array1<f32>>::from(result.to_owned()));
            }
        }

        Ok(out_bbox)
    }
}
