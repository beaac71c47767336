use parking_lot::RwLock;
use crate::pipeline::module::face_matching::GalleryEntry;

/// Shared in-memory gallery of enrolled embeddings. Rebuilt from disk at
/// startup and extended by each registration.
pub struct FaceGallery {
    entries: RwLock<Vec<GalleryEntry>>,
}

impl FaceGallery {
    pub fn new() -> Self {
        FaceGallery {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn add(&self, entry: GalleryEntry) {
        self.entries.write().push(entry);
    }

    pub fn snapshot(&self) -> Vec<GalleryEntry> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use ndarray::arr1;
    use super::*;

    #[test]
    fn test_add_and_snapshot() {
        let gallery = FaceGallery::new();
        assert!(gallery.is_empty());

        gallery.add(GalleryEntry {
            name: "arun".to_string(),
            usn: "2GI001".to_string(),
            embedding: arr1(&[1.0, 0.0]),
        });

        assert_eq!(gallery.len(), 1);
        let snapshot = gallery.snapshot();
        assert_eq!(snapshot[0].name, "arun");
    }
}
