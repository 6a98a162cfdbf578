//! File-backed snapshot exchange between the ingest and watch processes.
//!
//! Writers replace the artifact by renaming a fully written sibling file over
//! it, so a reader in another process sees either the previous snapshot or
//! the new one, never a partial write.

use crate::error::Result;
use crate::telemetry::Snapshot;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Why no snapshot is available.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NoData {
    #[error("no snapshot has been published yet")]
    Missing,

    #[error("snapshot artifact unreadable: {0}")]
    Unreadable(String),

    #[error("snapshot artifact corrupt: {0}")]
    Corrupt(String),

    #[error("snapshot is {}ms old", .age.as_millis())]
    Stale { age: Duration },
}

/// The externally visible current snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
    }

    /// Atomically replace the published snapshot.
    pub fn publish(&self, snapshot: &Snapshot) -> Result<()> {
        let content = snapshot.to_artifact_json()?;
        let temp = self.temp_path();

        let written = (|| -> io::Result<()> {
            let mut file = fs::File::create(&temp)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
            fs::rename(&temp, &self.path)
        })();

        if let Err(err) = written {
            let _ = fs::remove_file(&temp);
            return Err(err.into());
        }

        tracing::trace!(path = %self.path.display(), "Published snapshot");
        Ok(())
    }

    /// Read the most recently published snapshot.
    ///
    /// `produced_at` of the returned snapshot is the artifact's modification
    /// time, since the artifact itself only carries channel values.
    pub fn read(&self) -> std::result::Result<Snapshot, NoData> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(NoData::Missing),
            Err(err) => return Err(NoData::Unreadable(err.to_string())),
        };

        let produced_at = self.modified().unwrap_or_else(Utc::now);
        Snapshot::from_artifact_json(&content, produced_at)
            .map_err(|err| NoData::Corrupt(err.to_string()))
    }

    /// Read the snapshot, treating one older than `max_age` as no data.
    pub fn read_fresh(
        &self,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> std::result::Result<Snapshot, NoData> {
        let snapshot = self.read()?;
        let age = (now - snapshot.produced_at).to_std().unwrap_or(Duration::ZERO);
        if age > max_age {
            return Err(NoData::Stale { age });
        }
        Ok(snapshot)
    }

    /// Read from async code without blocking the runtime. `max_age` selects
    /// [`read_fresh`](Self::read_fresh) over [`read`](Self::read).
    pub async fn load(&self, max_age: Option<Duration>) -> std::result::Result<Snapshot, NoData> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || match max_age {
            Some(max_age) => store.read_fresh(max_age, Utc::now()),
            None => store.read(),
        })
        .await
        .unwrap_or_else(|err| Err(NoData::Unreadable(err.to_string())))
    }

    /// Modification time of the artifact.
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        let modified = fs::metadata(&self.path).ok()?.modified().ok()?;
        Some(DateTime::<Utc>::from(modified))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::Channel;
    use tempfile::TempDir;

    fn sample_snapshot() -> Snapshot {
        Snapshot::new(Utc::now())
            .with_value(Channel::Gas, 120.5)
            .with_value(Channel::Temperature, 25.0)
            .with_value(Channel::GasBeaconDistance, 3.2)
            .with_value(Channel::TempBeaconDistance, 4.0)
    }

    #[test]
    fn test_read_before_publish_is_missing() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("latest.json"));
        assert_eq!(store.read(), Err(NoData::Missing));
    }

    #[tokio::test]
    async fn test_load_off_the_runtime() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("latest.json"));
        assert_eq!(store.load(None).await, Err(NoData::Missing));

        store.publish(&sample_snapshot()).unwrap();
        let loaded = store.load(Some(Duration::from_secs(60))).await.unwrap();
        assert_eq!(loaded.value(Channel::Gas), 120.5);
    }

    #[test]
    fn test_publish_then_read() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("latest.json"));
        let snapshot = sample_snapshot();

        store.publish(&snapshot).unwrap();
        let read = store.read().unwrap();
        assert_eq!(read.values, snapshot.values);
    }

    #[test]
    fn test_publish_replaces_previous() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("latest.json"));

        store.publish(&sample_snapshot()).unwrap();
        store
            .publish(&Snapshot::new(Utc::now()).with_value(Channel::Gas, 400.0))
            .unwrap();

        let read = store.read().unwrap();
        assert_eq!(read.value(Channel::Gas), 400.0);
        assert_eq!(read.value(Channel::Temperature), 0.0);
    }

    #[test]
    fn test_publish_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("latest.json"));
        store.publish(&sample_snapshot()).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_corrupt_artifact_is_no_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latest.json");
        let store = SnapshotStore::new(&path);

        store.publish(&sample_snapshot()).unwrap();
        fs::write(&path, "{\"MQ3\": 12").unwrap();

        assert!(matches!(store.read(), Err(NoData::Corrupt(_))));
    }

    #[test]
    fn test_publish_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("absent").join("latest.json"));
        assert!(store.publish(&sample_snapshot()).is_err());
    }

    #[test]
    fn test_stale_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("latest.json"));
        store.publish(&sample_snapshot()).unwrap();

        let later = Utc::now() + chrono::Duration::seconds(30);
        assert!(matches!(
            store.read_fresh(Duration::from_secs(10), later),
            Err(NoData::Stale { .. })
        ));
        assert!(store.read_fresh(Duration::from_secs(60), later).is_ok());
    }
}
