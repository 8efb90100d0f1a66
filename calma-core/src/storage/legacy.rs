use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::warn;

/// Synchronous flat key-value namespace, one file per key.
///
/// Replaces the web frontend's localStorage. Read failures degrade to absent;
/// write failures are logged and dropped. The migration loader never deletes
/// from here: old data is left in place once it stops being authoritative.
pub struct LegacyStore {
    dir: PathBuf,
}

impl LegacyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.dir.join(key)) {
            Ok(blob) => Some(blob),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!("Reading legacy key '{}' failed, treating as absent: {}", key, err);
                None
            }
        }
    }

    pub fn put(&self, key: &str, blob: &str) {
        let result =
            fs::create_dir_all(&self.dir).and_then(|_| fs::write(self.dir.join(key), blob));
        if let Err(err) = result {
            warn!("Writing legacy key '{}' failed, skipping: {}", key, err);
        }
    }
}
