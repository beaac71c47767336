use ndarray::{Array1, Array2};

pub fn argsort_descending(scores_ravel: &Vec<f32>) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores_ravel.len()).collect();

    indices.sort_by(|&i, &j| scores_ravel[j].partial_cmp(&scores_ravel[i]).unwrap_or(std::cmp::Ordering::Equal));

    indices
}

pub fn l2_normalize(v: &Array1<f32>) -> Array1<f32> {
    let norm = v.mapv(|x| x * x).sum().sqrt();
    if norm == 0.0 {
        return v.to_owned();
    }
    v / norm
}

pub fn mean_std(arr: &Array2<f32>) -> (f32, f32) {
    let n = arr.len() as f32;
    if n == 0.0 {
        return (0.0, 0.0);
    }
    let mean = arr.sum() / n;
    let variance = arr.mapv(|x| (x - mean) * (x - mean)).sum() / n;
    (mean, variance.sqrt())
}

/// Variance of the 4-neighbour Laplacian response. Low values indicate a
/// blurred or texture-poor patch.
pub fn laplacian_variance(gray: &Array2<f32>) -> f32 {
    let (rows, cols) = gray.dim();
    if rows < 3 || cols < 3 {
        return 0.0;
    }

    let mut responses: Vec<f32> = Vec::with_capacity((rows - 2) * (cols - 2));
    for i in 1..rows - 1 {
        for j in 1..cols - 1 {
            let response = gray[[i - 1, j]] + gray[[i + 1, j]] + gray[[i, j - 1]] + gray[[i, j + 1]]
                - 4.0 * gray[[i, j]];
            responses.push(response);
        }
    }

    let n = responses.len() as f32;
    let mean = responses.iter().sum::<f32>() / n;
    responses.iter().map(|r| (r - mean) * (r - mean)).sum::<f32>() / n
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, Array2};
    use super::*;

    #[test]
    fn test_argsort_descending() {
        let scores = vec![0.2, 0.9, 0.5];
        assert_eq!(argsort_descending(&scores), vec![1, 2, 0]);
    }

    #[test]
    fn test_l2_normalize() {
        let v = arr1(&[3.0, 4.0]);
        let normalized = l2_normalize(&v);
        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);

        let zero = arr1(&[0.0, 0.0]);
        assert_eq!(l2_normalize(&zero), zero);
    }

    #[test]
    fn test_mean_std() {
        let arr = Array2::from_shape_vec((1, 4), vec![2.0, 4.0, 4.0, 6.0]).unwrap();
        let (mean, std) = mean_std(&arr);
        assert!((mean - 4.0).abs() < 1e-6);
        assert!((std - std::f32::consts::SQRT_2).abs() < 1e-5);
    }

    #[test]
    fn test_laplacian_variance_flat_vs_textured() {
        let flat = Array2::<f32>::from_elem((16, 16), 128.0);
        assert!(laplacian_variance(&flat) < 1e-6);

        let textured = Array2::from_shape_fn((16, 16), |(i, j)| {
            if (i + j) % 2 == 0 { 255.0 } else { 0.0 }
        });
        assert!(laplacian_variance(&textured) > 1_000.0);
    }
}
