use crate::types::{ItemRecord, MonitorError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Durable per-item record store: one YAML file per item, named by item id,
/// under a metadata directory created lazily at startup.
///
/// A record existing with `downloaded: true` is the single authoritative
/// signal that an item has been processed. Records are never deleted.
pub struct MetadataStore {
    dir: PathBuf,
}

impl MetadataStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, item_id: &str) -> PathBuf {
        self.dir.join(format!("{item_id}.yaml"))
    }

    pub fn record_exists(&self, item_id: &str) -> bool {
        self.record_path(item_id).exists()
    }

    /// Scan all persisted records and return the ids marked `downloaded: true`.
    /// An absent or empty store yields an empty set. Unreadable record files
    /// are skipped with a warning rather than failing the scan, so one corrupt
    /// file cannot take the monitor down.
    pub fn processed_ids(&self) -> Result<HashSet<String>> {
        let mut processed = HashSet::new();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(processed),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", self.dir.display(), e);
                    continue;
                }
            };
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let Some(item_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.read_mapping(&path) {
                Ok(mapping) => {
                    let downloaded = mapping
                        .get("downloaded")
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false);
                    if downloaded {
                        processed.insert(item_id.to_string());
                    }
                }
                Err(e) => {
                    warn!("Skipping unreadable record {}: {}", path.display(), e);
                }
            }
        }

        debug!("Loaded {} processed ids from {}", processed.len(), self.dir.display());
        Ok(processed)
    }

    /// Write a full record snapshot, replacing any prior record for this id.
    /// The write is atomic from a reader's perspective: the content goes to a
    /// temporary file in the same directory, then renames over the target.
    pub fn create_or_replace(&self, item_id: &str, record: &ItemRecord) -> Result<()> {
        let content = serde_yaml::to_string(record)?;
        self.publish(item_id, &content)
    }

    /// Shallow-merge the given fields over an existing record and write it
    /// back atomically. Untouched fields keep their values and their position
    /// in the file. Fails with `RecordNotFound` if no record exists; callers
    /// treat that as a reported, non-fatal condition.
    pub fn merge_update(&self, item_id: &str, fields: serde_yaml::Mapping) -> Result<()> {
        let path = self.record_path(item_id);
        if !path.exists() {
            return Err(MonitorError::RecordNotFound {
                item_id: item_id.to_string(),
            });
        }

        let mut mapping = self.read_mapping(&path)?;
        for (key, value) in fields {
            mapping.insert(key, value);
        }

        let content = serde_yaml::to_string(&mapping)?;
        self.publish(item_id, &content)
    }

    /// Read a record back as a typed `ItemRecord`.
    pub fn read_record(&self, item_id: &str) -> Result<ItemRecord> {
        let path = self.record_path(item_id);
        if !path.exists() {
            return Err(MonitorError::RecordNotFound {
                item_id: item_id.to_string(),
            });
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    fn read_mapping(&self, path: &Path) -> Result<serde_yaml::Mapping> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    fn publish(&self, item_id: &str, content: &str) -> Result<()> {
        let path = self.record_path(item_id);
        let tmp_path = self.dir.join(format!("{item_id}.yaml.tmp"));
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &path)?;
        debug!("Wrote record {}", path.display());
        Ok(())
    }
}
