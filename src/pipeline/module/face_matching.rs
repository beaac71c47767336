use ndarray::Array1;

/// A registered identity held by the in-memory gallery.
#[derive(Debug, Clone)]
pub struct GalleryEntry {
    pub name: String,
    pub usn: String,
    pub embedding: Array1<f32>,
}

#[derive(Debug, Clone)]
pub struct FaceMatch {
    pub name: String,
    pub usn: String,
    pub distance: f32,
}

#[derive(Debug, Clone)]
pub struct FaceMatching {
    distance_threshold: f32,
}

/// Both vectors are L2-normalized upstream, so cosine distance reduces to
/// `1 - dot`.
pub fn cosine_distance(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
    1.0 - a.dot(b)
}

impl FaceMatching {
    pub fn new(distance_threshold: f32) -> Self {
        FaceMatching {
            distance_threshold,
        }
    }

    /// Best gallery identity strictly under the distance threshold, if any.
    pub fn call(&self, probe: &Array1<f32>, gallery: &[GalleryEntry]) -> Option<FaceMatch> {
        let mut best_distance = self.distance_threshold;
        let mut best: Option<FaceMatch> = None;

        for entry in gallery {
            if entry.embedding.len() != probe.len() {
                continue;
            }
            let distance = cosine_distance(probe, &entry.embedding);
            if distance < best_distance {
                best_distance = distance;
                best = Some(FaceMatch {
                    name: entry.name.clone(),
                    usn: entry.usn.clone(),
                    distance,
                });
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use ndarray::arr1;
    use super::*;

    fn entry(name: &str, usn: &str, embedding: Array1<f32>) -> GalleryEntry {
        GalleryEntry {
            name: name.to_string(),
            usn: usn.to_string(),
            embedding,
        }
    }

    #[test]
    fn test_exact_match_wins() {
        let matching = FaceMatching::new(0.50);
        let probe = arr1(&[1.0, 0.0, 0.0]);
        let gallery = vec![
            entry("arun", "2GI001", arr1(&[0.0, 1.0, 0.0])),
            entry("priya", "2GI002", arr1(&[1.0, 0.0, 0.0])),
        ];

        let matched = matching.call(&probe, &gallery).unwrap();
        assert_eq!(matched.name, "priya");
        assert!(matched.distance < 1e-6);
    }

    #[test]
    fn test_no_match_over_threshold() {
        let matching = FaceMatching::new(0.50);
        let probe = arr1(&[1.0, 0.0]);
        let gallery = vec![entry("arun", "2GI001", arr1(&[0.0, 1.0]))];

        assert!(matching.call(&probe, &gallery).is_none());
    }

    #[test]
    fn test_closest_of_several_wins() {
        let matching = FaceMatching::new(0.50);
        let probe = l2(&[1.0, 0.2]);
        let gallery = vec![
            entry("arun", "2GI001", l2(&[1.0, 0.0])),
            entry("priya", "2GI002", l2(&[1.0, 0.19])),
        ];

        let matched = matching.call(&probe, &gallery).unwrap();
        assert_eq!(matched.name, "priya");
    }

    #[test]
    fn test_dimension_mismatch_is_skipped() {
        let matching = FaceMatching::new(0.50);
        let probe = arr1(&[1.0, 0.0]);
        let gallery = vec![entry("arun", "2GI001", arr1(&[1.0, 0.0, 0.0]))];

        assert!(matching.call(&probe, &gallery).is_none());
    }

    fn l2(v: &[f32]) -> Array1<f32> {
        let arr = arr1(v);
        let norm = arr.mapv(|x| x * x).sum().sqrt();
        arr / norm
    }
}
