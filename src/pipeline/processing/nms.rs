use ndarray::Array2;
use crate::pipeline::utils::utils::argsort_descending;

fn box_area(dets: &Array2<f32>, i: usize) -> f32 {
    (dets[[i, 2]] - dets[[i, 0]]).max(0.0) * (dets[[i, 3]] - dets[[i, 1]]).max(0.0)
}

/// Greedy non-maximum suppression over `[x1, y1, x2, y2, score]` rows.
/// Returns indices of the kept rows, highest score first.
pub fn nms(dets: &Array2<f32>, thresh: f32) -> Vec<usize> {
    let scores: Vec<f32> = dets.column(4).to_vec();
    let mut order = argsort_descending(&scores);

    let mut keep: Vec<usize> = Vec::new();

    while !order.is_empty() {
        let i = order[0];
        keep.push(i);

        let mut remaining: Vec<usize> = Vec::with_capacity(order.len().saturating_sub(1));
        for &j in &order[1..] {
            let xx1 = f32::max(dets[[i, 0]], dets[[j, 0]]);
            let yy1 = f32::max(dets[[i, 1]], dets[[j, 1]]);
            let xx2 = f32::min(dets[[i, 2]], dets[[j, 2]]);
            let yy2 = f32::min(dets[[i, 3]], dets[[j, 3]]);

            let inter = (xx2 - xx1).max(0.0) * (yy2 - yy1).max(0.0);
            let union = box_area(dets, i) + box_area(dets, j) - inter;
            let overlap = if union > 0.0 { inter / union } else { 0.0 };

            if overlap <= thresh {
                remaining.push(j);
            }
        }
        order = remaining;
    }

    keep
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use super::*;

    #[test]
    fn test_nms_suppresses_duplicates() {
        let dets = array![
            [100.0, 100.0, 210.0, 210.0, 0.72],
            [250.0, 250.0, 420.0, 420.0, 0.8],
            [220.0, 220.0, 320.0, 330.0, 0.92],
            [100.0, 100.0, 210.0, 210.0, 0.6],
        ];
        let keep = nms(&dets, 0.45);

        // The duplicate of the first box is suppressed.
        assert_eq!(keep.len(), 3);
        assert_eq!(keep[0], 2);
        assert!(!keep.contains(&3));
    }

    #[test]
    fn test_nms_keeps_disjoint_boxes() {
        let dets = array![
            [0.0, 0.0, 10.0, 10.0, 0.9],
            [100.0, 100.0, 110.0, 110.0, 0.5],
        ];
        let keep = nms(&dets, 0.3);
        assert_eq!(keep, vec![0, 1]);
    }

    #[test]
    fn test_nms_empty() {
        let dets = Array2::<f32>::zeros((0, 5));
        assert!(nms(&dets, 0.5).is_empty());
    }
}
