use std::{future::Future, io::ErrorKind, ops::Deref, path::PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::fs::operations::{with_file_lock, write_atomically, LockKind};

use super::entities::TimeData;

const DATA_FILE: &str = "time_data.json";
const LOCK_FILE: &str = ".time_data.lock";

/// Interface for abstracting storage of accumulated time. Both operations move the whole
/// document.
pub trait TimeStorage {
    /// Reads every recorded day. A store that was never written is empty.
    fn read_all(&self) -> impl Future<Output = Result<TimeData>>;

    /// Replaces every recorded day with `data`.
    fn write_all(&self, data: &TimeData) -> impl Future<Output = Result<()>>;

    /// Applies `change` to the stored document. No other writer can run between the read and the
    /// write. The document is only rewritten when `change` modified it.
    fn update<R>(
        &self,
        change: impl FnOnce(&mut TimeData) -> R,
    ) -> impl Future<Output = Result<R>>;
}

impl<T: Deref> TimeStorage for T
where
    T::Target: TimeStorage,
{
    fn read_all(&self) -> impl Future<Output = Result<TimeData>> {
        self.deref().read_all()
    }

    fn write_all(&self, data: &TimeData) -> impl Future<Output = Result<()>> {
        self.deref().write_all(data)
    }

    fn update<R>(
        &self,
        change: impl FnOnce(&mut TimeData) -> R,
    ) -> impl Future<Output = Result<R>> {
        self.deref().update(change)
    }
}

/// The main realization of [TimeStorage]. Keeps the document as json inside the application
/// directory.
pub struct JsonTimeStorage {
    data_path: PathBuf,
    lock_path: PathBuf,
}

impl JsonTimeStorage {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;

        Ok(Self {
            data_path: dir.join(DATA_FILE),
            lock_path: dir.join(LOCK_FILE),
        })
    }

    /// Reads the document. Callers hold the lock.
    async fn load(&self) -> Result<TimeData> {
        debug!("Reading {:?}", self.data_path);
        match tokio::fs::read(&self.data_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("{:?} is not a valid time store", self.data_path)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(TimeData::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the document. Callers hold the exclusive lock.
    async fn store(&self, data: &TimeData) -> Result<()> {
        write_atomically(&self.data_path, serde_json::to_vec(data)?).await
    }
}

impl TimeStorage for JsonTimeStorage {
    async fn read_all(&self) -> Result<TimeData> {
        with_file_lock(&self.lock_path, LockKind::Shared, self.load()).await
    }

    async fn write_all(&self, data: &TimeData) -> Result<()> {
        with_file_lock(&self.lock_path, LockKind::Exclusive, self.store(data)).await
    }

    async fn update<R>(&self, change: impl FnOnce(&mut TimeData) -> R) -> Result<R> {
        with_file_lock(&self.lock_path, LockKind::Exclusive, async {
            let mut data = self.load().await?;
            let before = data.clone();
            let result = change(&mut data);
            if data != before {
                self.store(&data).await?;
            }
            Ok(result)
        })
        .await
    }
}

/// Store kept in memory, for tests that must not touch the blocking pool.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStorage {
    data: std::sync::Mutex<TimeData>,
}

#[cfg(test)]
impl MemoryStorage {
    pub fn snapshot(&self) -> TimeData {
        self.data.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl TimeStorage for MemoryStorage {
    async fn read_all(&self) -> Result<TimeData> {
        Ok(self.snapshot())
    }

    async fn write_all(&self, data: &TimeData) -> Result<()> {
        *self.data.lock().unwrap() = data.clone();
        Ok(())
    }

    async fn update<R>(&self, change: impl FnOnce(&mut TimeData) -> R) -> Result<R> {
        let mut data = self.data.lock().unwrap();
        Ok(change(&mut *data))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    use crate::daemon::storage::{
        entities::TimeData,
        time_storage::{JsonTimeStorage, TimeStorage, DATA_FILE},
    };

    const TEST_DATE: NaiveDate = NaiveDate::from_ymd_opt(2018, 7, 4).unwrap();

    #[tokio::test]
    async fn test_missing_store_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let storage = JsonTimeStorage::new(dir.path().join("nested"))?;

        assert!(storage.read_all().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_write_then_read() -> Result<()> {
        let dir = tempdir()?;
        let storage = JsonTimeStorage::new(dir.path().to_owned())?;
        let mut data = TimeData::default();
        data.add(TEST_DATE, "www.example.com", 42);
        data.add(TEST_DATE, "docs.rs", 7);

        storage.write_all(&data).await?;

        assert_eq!(storage.read_all().await?, data);
        Ok(())
    }

    #[tokio::test]
    async fn test_reads_existing_document() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(
            dir.path().join(DATA_FILE),
            r#"{"2024-01-01":{"a.com":10},"2024-01-02":{"a.com":5,"b.com":3}}"#,
        )?;
        let storage = JsonTimeStorage::new(dir.path().to_owned())?;

        let data = storage.read_all().await?;

        assert_eq!(data.day("2024-01-02").unwrap().get("b.com"), Some(3));
        assert_eq!(data.days().count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_applies_change() -> Result<()> {
        let dir = tempdir()?;
        let storage = JsonTimeStorage::new(dir.path().to_owned())?;
        let mut data = TimeData::default();
        data.add(TEST_DATE, "a.com", 1);
        storage.write_all(&data).await?;

        let total = storage.update(|data| data.add(TEST_DATE, "a.com", 2)).await?;

        assert_eq!(total, 3);
        assert_eq!(
            storage.read_all().await?.day("2018-07-04").unwrap().get("a.com"),
            Some(3)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_unchanged_update_does_not_write() -> Result<()> {
        let dir = tempdir()?;
        let storage = JsonTimeStorage::new(dir.path().to_owned())?;

        storage.update(|data| data.retain_since(TEST_DATE)).await?;

        assert!(!dir.path().join(DATA_FILE).exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupted_document_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join(DATA_FILE), "{\"2024-01-01\": {\"a.com\": ")?;
        let storage = JsonTimeStorage::new(dir.path().to_owned())?;

        assert!(storage.read_all().await.is_err());
        Ok(())
    }
}
