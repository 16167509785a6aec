use crate::error::Result;
use crate::models::SignedRecord;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Trait for the per-slot status record storage.
#[async_trait]
pub trait MarkerStore: Send + Sync {
    /// All readable records of a slot, oldest first.
    async fn records(&self, slot: &str) -> Result<Vec<SignedRecord>>;
    /// Appends one record to its slot.
    async fn append(&self, record: &SignedRecord) -> Result<()>;

    /// Whether `day` (`YYYY-MM-DD`) already has a settling record for the slot.
    async fn done_today(&self, slot: &str, day: &str) -> Result<bool> {
        let records = self.records(slot).await?;
        Ok(records
            .iter()
            .any(|r| r.day() == day && r.status.is_final()))
    }
}

/// Append-only text file per slot, `SIGNED_<slot>.txt`.
pub struct FileMarkerStore {
    dir: PathBuf,
}

impl FileMarkerStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of a slot's marker file. Characters unsafe in file names become `_`.
    pub fn path_for(&self, slot: &str) -> PathBuf {
        let safe: String = slot
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("SIGNED_{}.txt", safe))
    }
}

#[async_trait]
impl MarkerStore for FileMarkerStore {
    async fn records(&self, slot: &str) -> Result<Vec<SignedRecord>> {
        let path = self.path_for(slot);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await?;
        let records = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match SignedRecord::parse_line(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable marker line");
                    None
                }
            })
            .collect();

        Ok(records)
    }

    async fn append(&self, record: &SignedRecord) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).await?;
        }

        let path = self.path_for(&record.slot);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        let line = format!("{}\n", record.to_line());
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(path = %path.display(), status = %record.status, "marker line appended");
        Ok(())
    }
}
