use anyhow::{Context, Result};
use bincode::{deserialize, serialize};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use super::StoreSnapshot;

/// On-disk form of the review store.
///
/// Binary (bincode) with optional gzip. Writes go to a temp file that is then
/// renamed over the target, so a crash mid-write leaves the old snapshot intact.
#[derive(Debug, Clone)]
pub struct SnapshotStorage {
    path: PathBuf,
    use_compression: bool,
}

impl SnapshotStorage {
    pub fn new(path: &Path, use_compression: bool) -> Self {
        Self {
            path: path.to_path_buf(),
            use_compression,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<StoreSnapshot> {
        if !self.path.exists() {
            debug!(path = ?self.path, "Review store file does not exist, starting empty");
            return Ok(StoreSnapshot::default());
        }

        let start = std::time::Instant::now();
        let data = std::fs::read(&self.path)
            .with_context(|| format!("Failed to read review store {:?}", self.path))?;

        let decoded = if self.use_compression {
            let mut decoder = GzDecoder::new(&data[..]);
            let mut decompressed = Vec::new();
            match decoder.read_to_end(&mut decompressed) {
                Ok(_) => decompressed,
                Err(e) => return Ok(self.set_aside(&e.to_string())),
            }
        } else {
            data
        };

        let snapshot: StoreSnapshot = match deserialize(&decoded) {
            Ok(snapshot) => snapshot,
            Err(e) => return Ok(self.set_aside(&e.to_string())),
        };

        info!(
            operation = "store_load",
            reviews = snapshot.len(),
            responses = snapshot.response_count(),
            "Loaded review store in {:?}",
            start.elapsed()
        );
        Ok(snapshot)
    }

    pub fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let start = std::time::Instant::now();
        let serialized = serialize(snapshot)?;

        let encoded = if self.use_compression {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&serialized)?;
            encoder.finish()?
        } else {
            serialized
        };

        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, encoded)
            .with_context(|| format!("Failed to write {:?}", temp_path))?;
        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to replace {:?}", self.path))?;

        debug!(reviews = snapshot.len(), "Saved review store in {:?}", start.elapsed());
        Ok(())
    }

    pub fn size(&self) -> Result<u64> {
        if self.path.exists() {
            Ok(std::fs::metadata(&self.path)?.len())
        } else {
            Ok(0)
        }
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            info!(path = ?self.path, "Removed review store");
        }
        Ok(())
    }

    // Unreadable snapshot: keep a .bak copy and start over empty
    fn set_aside(&self, error: &str) -> StoreSnapshot {
        let backup_path = self.path.with_extension("bin.bak");
        match std::fs::copy(&self.path, &backup_path) {
            Ok(_) => warn!(
                error,
                backup = ?backup_path,
                "Review store unreadable, backed up and starting empty"
            ),
            Err(backup_err) => warn!(
                error,
                backup_error = %backup_err,
                "Review store unreadable and backup failed, starting empty"
            ),
        }
        StoreSnapshot::default()
    }
}
