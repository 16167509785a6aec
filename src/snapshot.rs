use crate::clock;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// Saves fetched pages next to the marker files for post-mortem inspection.
///
/// Writing is best-effort: a failed snapshot is logged and otherwise ignored.
#[derive(Debug, Clone, Default)]
pub struct SnapshotWriter {
    dir: Option<PathBuf>,
}

impl SnapshotWriter {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: Some(dir.as_ref().to_path_buf()),
        }
    }

    pub fn disabled() -> Self {
        Self { dir: None }
    }

    pub fn from_option(dir: Option<&Path>) -> Self {
        dir.map(Self::new).unwrap_or_else(Self::disabled)
    }

    /// Writes `<dir>/<YYYYMMDD_HHMMSS>_<name>.html` and returns its path.
    pub async fn save(&self, name: &str, html: &str) -> Option<PathBuf> {
        self.save_with_extension(name, "html", html).await
    }

    /// Same as [`save`](Self::save) for bodies that are not HTML, e.g. JSON replies.
    pub async fn save_with_extension(
        &self,
        name: &str,
        extension: &str,
        body: &str,
    ) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        let path = dir.join(format!(
            "{}_{}.{}",
            clock::snapshot_stamp(&clock::now()),
            name,
            extension
        ));

        let written = async {
            fs::create_dir_all(dir).await?;
            fs::write(&path, body).await
        }
        .await;

        match written {
            Ok(()) => {
                info!(path = %path.display(), "page snapshot saved");
                Some(path)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not save page snapshot");
                None
            }
        }
    }
}
