use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use anyhow::Error;
use chrono::Local;
use csv::{ReaderBuilder, WriterBuilder};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UidRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "USN")]
    pub usn: String,
}

/// Face photos on disk plus the `Name,USN` roster. Photos are named
/// `<name>_<millis>.jpg`; the student name is the stem before the first `_`.
pub struct EnrollmentRepository {
    known_faces_dir: PathBuf,
    uids_file: PathBuf,
    write_lock: Mutex<()>,
}

impl EnrollmentRepository {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(known_faces_dir: P, uids_file: Q) -> Result<Self, Error> {
        let known_faces_dir = known_faces_dir.as_ref().to_path_buf();
        let uids_file = uids_file.as_ref().to_path_buf();

        fs::create_dir_all(&known_faces_dir)?;
        if !uids_file.exists() {
            fs::write(&uids_file, "Name,USN\n")?;
        }

        Ok(EnrollmentRepository {
            known_faces_dir,
            uids_file,
            write_lock: Mutex::new(()),
        })
    }

    /// Lowercased name -> uppercased USN. Later rows win on duplicates.
    pub fn load_uid_map(&self) -> Result<HashMap<String, String>, Error> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(&self.uids_file)?;
        let mut uid_map = HashMap::new();
        for row in reader.deserialize() {
            let record: UidRecord = row?;
            uid_map.insert(record.name.to_lowercase(), record.usn.to_uppercase());
        }
        Ok(uid_map)
    }

    pub fn list_photos(&self) -> Result<Vec<(String, PathBuf)>, Error> {
        let mut photos = Vec::new();

        for dir_entry in fs::read_dir(&self.known_faces_dir)? {
            let path = dir_entry?.path();
            let file_name = match path.file_name().and_then(|n| n.to_str()) {
                Some(file_name) => file_name,
                None => continue,
            };

            let lowered = file_name.to_lowercase();
            if !(lowered.ends_with(".jpg") || lowered.ends_with(".jpeg") || lowered.ends_with(".png")) {
                continue;
            }

            let stem = file_name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file_name);
            let name = stem.split('_').next().unwrap_or(stem).to_lowercase();
            photos.push((name, path.clone()));
        }

        photos.sort();
        Ok(photos)
    }

    /// Persists a new photo and roster row. Millisecond timestamps keep
    /// repeated registrations from clobbering earlier photos.
    pub fn save_photo(&self, name: &str, usn: &str, image_bytes: &[u8]) -> Result<PathBuf, Error> {
        let _guard = self.write_lock.lock();

        let mut file_path = self.known_faces_dir.join(format!("{}_{}.jpg", name, Local::now().timestamp_millis()));
        while file_path.exists() {
            file_path = self.known_faces_dir.join(format!("{}_{}.jpg", name, Local::now().timestamp_nanos_opt().unwrap_or_default()));
        }
        fs::write(&file_path, image_bytes)?;

        let file = OpenOptions::new().append(true).open(&self.uids_file)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.serialize(UidRecord {
            name: name.to_string(),
            usn: usn.to_string(),
        })?;
        writer.flush()?;

        Ok(file_path)
    }
}
