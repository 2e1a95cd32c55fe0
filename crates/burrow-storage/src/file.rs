use async_trait::async_trait;
use burrow_core::error::{Result, StorageError};
use burrow_core::{OwnerId, ShortKey, Storage};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// One line of the log.
#[derive(Debug, Serialize, Deserialize)]
struct Record {
    short_key: String,
    original_url: String,
}

/// Append-only file implementation of [`Storage`].
///
/// Every save appends one JSON object followed by a newline. There is no
/// index and no compaction: lookups scan the file from the top, so this
/// backend is a durability backstop behind faster ones rather than a
/// primary read path. Owners and deletions are not recorded.
///
/// Because there are no tombstones, a key deleted in the relational backend
/// still resolves from this log once the in-memory copy is gone (after a
/// restart, for instance): the file is read before the database.
///
/// A single async mutex serializes appends and scans so a reader never
/// observes a half-written line.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Opens (creating if needed) the log at `path`.
    ///
    /// The parent directory is created eagerly so that a misconfigured path
    /// is reported at startup instead of on the first save.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        debug!(path = %path.display(), "opened file storage");
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open_for_scan(&self) -> Result<Option<BufReader<File>>> {
        match File::open(&self.path).await {
            Ok(file) => Ok(Some(BufReader::new(file))),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Scans the log top to bottom and returns the first record accepted by
    /// `matches`. Lines are read as raw bytes so that malformed ones,
    /// including invalid UTF-8, are skipped.
    async fn scan<F>(&self, matches: F) -> Result<Option<Record>>
    where
        F: Fn(&Record) -> bool + Send,
    {
        let _guard = self.lock.lock().await;

        let Some(mut reader) = self.open_for_scan().await? else {
            return Ok(None);
        };

        let mut line = Vec::new();
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line).await? == 0 {
                break;
            }
            let record: Record = match serde_json::from_slice(&line) {
                Ok(record) => record,
                Err(err) => {
                    trace!(error = %err, "skipping malformed line");
                    continue;
                }
            };
            if matches(&record) {
                return Ok(Some(record));
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl Storage for FileStorage {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn save(&self, _owner: &OwnerId, original_url: &str, key: &ShortKey) -> Result<()> {
        let record = Record {
            short_key: key.to_string(),
            original_url: original_url.to_owned(),
        };
        let mut line = serde_json::to_vec(&record)
            .map_err(|e| StorageError::InvalidData(format!("failed to encode record: {e}")))?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        trace!(key = %key, path = %self.path.display(), "appended mapping to file");
        Ok(())
    }

    async fn get_original_url(&self, key: &ShortKey) -> Result<String> {
        let wanted = key.as_str();
        match self.scan(|record| record.short_key == wanted).await? {
            Some(record) => Ok(record.original_url),
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }

    async fn get_short_key(&self, original_url: &str) -> Result<Option<ShortKey>> {
        let record = self
            .scan(|record| record.original_url == original_url)
            .await?;
        Ok(record.map(|record| ShortKey::new_unchecked(record.short_key)))
    }
}
