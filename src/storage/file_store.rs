use std::{
    fs::{File, OpenOptions},
    io::{ErrorKind, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::Result;
use fs4::fs_std::FileExt;
use tracing::debug;

use super::{DocumentStore, STORAGE_KEY};

/// The main realization of [DocumentStore]. Keeps the document in a single file inside the
/// application directory.
///
/// The document itself is replaced by renaming, so it can't carry the lock. Readers and writers
/// lock a sidecar file with a stable path instead.
pub struct FileDocumentStore {
    path: PathBuf,
}

impl FileDocumentStore {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;

        Ok(Self {
            path: dir.join(STORAGE_KEY),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn temporary_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    fn open_lock(&self) -> std::io::Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())
    }

    fn read(&self) -> Result<Option<Vec<u8>>> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => Err(e)?,
        };
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Ok(Some(buffer))
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        // Written next to the target and renamed over it, so a crash mid-write never leaves a
        // truncated document behind.
        let temporary = self.temporary_path();
        let mut file = File::create(&temporary)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        std::fs::rename(&temporary, &self.path)?;
        Ok(())
    }
}

impl DocumentStore for FileDocumentStore {
    fn load(&self) -> Result<Option<Vec<u8>>> {
        debug!("Loading {:?}", self.path);
        let lock = self.open_lock()?;

        FileExt::lock_shared(&lock)?;
        let result = self.read();
        FileExt::unlock(&lock)?;

        result
    }

    fn save(&self, bytes: &[u8]) -> Result<()> {
        let lock = self.open_lock()?;

        FileExt::lock_exclusive(&lock)?;
        let result = self.write(bytes);
        FileExt::unlock(&lock)?;
        result?;

        debug!("Saved {} bytes into {:?}", bytes.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{fs::File, sync::mpsc, thread, time::Duration};

    use anyhow::Result;
    use fs4::fs_std::FileExt;
    use tempfile::tempdir;

    use crate::storage::{DocumentStore, STORAGE_KEY};

    use super::FileDocumentStore;

    #[test]
    fn test_load_without_file() -> Result<()> {
        let dir = tempdir()?;
        let store = FileDocumentStore::new(dir.path().join("nested"))?;
        assert_eq!(store.load()?, None);
        Ok(())
    }

    #[test]
    fn test_save_overwrites() -> Result<()> {
        let dir = tempdir()?;
        let store = FileDocumentStore::new(dir.path().to_path_buf())?;

        store.save(b"{\"first\": \"a much longer document\"}")?;
        store.save(b"{}")?;

        assert_eq!(store.load()?, Some(b"{}".to_vec()));
        assert_eq!(store.path(), dir.path().join(STORAGE_KEY));

        let mut files = std::fs::read_dir(dir.path())?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<_>, _>>()?;
        files.sort();
        assert_eq!(files, vec![store.path().to_path_buf(), store.lock_path()]);
        Ok(())
    }

    #[test]
    fn test_access_waits_for_lock_holder() -> Result<()> {
        let dir = tempdir()?;
        let store = FileDocumentStore::new(dir.path().to_path_buf())?;
        store.save(b"{}")?;

        let holder = File::open(store.lock_path())?;
        FileExt::lock_exclusive(&holder)?;

        thread::scope(|scope| -> Result<()> {
            let (sender, receiver) = mpsc::channel();
            let store = &store;
            scope.spawn(move || {
                let _ = sender.send(store.save(b"[2]").and_then(|_| store.load()));
            });

            assert!(receiver.recv_timeout(Duration::from_millis(200)).is_err());
            FileExt::unlock(&holder)?;
            let loaded = receiver.recv_timeout(Duration::from_secs(10))??;
            assert_eq!(loaded, Some(b"[2]".to_vec()));
            Ok(())
        })
    }

    #[test]
    fn test_reopened_store_reads_previous_save() -> Result<()> {
        let dir = tempdir()?;
        FileDocumentStore::new(dir.path().to_path_buf())?.save(b"[1]")?;

        let store = FileDocumentStore::new(dir.path().to_path_buf())?;
        assert_eq!(store.load()?, Some(b"[1]".to_vec()));
        Ok(())
    }
}
