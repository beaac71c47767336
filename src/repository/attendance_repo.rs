use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use anyhow::Error;
use chrono::Local;
use csv::{ReaderBuilder, WriterBuilder};
use log::info;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "USN")]
    pub usn: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Time")]
    pub time: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkOutcome {
    Marked,
    AlreadyMarked,
}

/// Append-only CSV ledger of daily attendance, one row per student per day.
pub struct AttendanceRepository {
    file_path: PathBuf,
    write_lock: Mutex<()>,
}

impl AttendanceRepository {
    pub fn new<P: AsRef<Path>>(file_path: P) -> Result<Self, Error> {
        let file_path = file_path.as_ref().to_path_buf();

        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if !file_path.exists() {
            fs::write(&file_path, "Name,USN,Date,Time\n")?;
        }

        Ok(AttendanceRepository {
            file_path,
            write_lock: Mutex::new(()),
        })
    }

    /// Marks `name` present today. A second mark on the same day is reported
    /// as `AlreadyMarked` and leaves the ledger untouched.
    pub fn mark(&self, name: &str, usn: &str) -> Result<MarkOutcome, Error> {
        let _guard = self.write_lock.lock();

        let now = Local::now();
        let date = now.format("%Y-%m-%d").to_string();
        let time = now.format("%H:%M:%S").to_string();

        for record in self.read_all()? {
            if record.name == name && record.date == date {
                return Ok(MarkOutcome::AlreadyMarked);
            }
        }

        let file = OpenOptions::new().append(true).open(&self.file_path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.serialize(AttendanceRecord {
            name: name.to_string(),
            usn: usn.to_string(),
            date,
            time,
        })?;
        writer.flush()?;

        info!("attendance marked for {name} ({usn})");
        Ok(MarkOutcome::Marked)
    }

    /// Ledger page in insertion order, plus the total row count.
    pub fn list(&self, offset: u64, limit: u32) -> Result<(Vec<AttendanceRecord>, u64), Error> {
        let records = self.read_all()?;
        let total = records.len() as u64;

        let page = records
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok((page, total))
    }

    /// Raw CSV contents, header included.
    pub fn export_csv(&self) -> Result<String, Error> {
        if !self.file_path.exists() {
            return Err(Error::msg("attendance ledger does not exist"));
        }
        Ok(fs::read_to_string(&self.file_path)?)
    }

    fn read_all(&self) -> Result<Vec<AttendanceRecord>, Error> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(&self.file_path)?;
        let mut records = Vec::new();
        for row in reader.deserialize() {
            let record: AttendanceRecord = row?;
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    fn repository() -> (tempfile::TempDir, AttendanceRepository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = AttendanceRepository::new(dir.path().join("attendance.csv")).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_new_creates_ledger_with_header() {
        let (dir, repo) = repository();
        let csv = repo.export_csv().unwrap();
        assert_eq!(csv, "Name,USN,Date,Time\n");
        drop(dir);
    }

    #[test]
    fn test_mark_once_per_day() {
        let (_dir, repo) = repository();

        assert_eq!(repo.mark("arun", "2GI001").unwrap(), MarkOutcome::Marked);
        assert_eq!(repo.mark("arun", "2GI001").unwrap(), MarkOutcome::AlreadyMarked);
        assert_eq!(repo.mark("priya", "2GI002").unwrap(), MarkOutcome::Marked);

        let (records, total) = repo.list(0, 50).unwrap();
        assert_eq!(total, 2);
        assert_eq!(records[0].name, "arun");
        assert_eq!(records[1].name, "priya");
    }

    #[test]
    fn test_list_pagination() {
        let (_dir, repo) = repository();
        for i in 0..5 {
            repo.mark(&format!("student{i}"), &format!("2GI00{i}")).unwrap();
        }

        let (page, total) = repo.list(2, 2).unwrap();
        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].name, "student2");
        assert_eq!(page[1].name, "student3");

        let (tail, _) = repo.list(4, 10).unwrap();
        assert_eq!(tail.len(), 1);
    }

    #[test]
    fn test_export_round_trips_rows() {
        let (_dir, repo) = repository();
        repo.mark("arun", "2GI001").unwrap();

        let csv = repo.export_csv().unwrap();
        assert!(csv.starts_with("Name,USN,Date,Time\n"));
        assert!(csv.contains("arun,2GI001,"));
    }
}
