use std::{future::Future, io::Write, path::Path};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use tokio::fs::File;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    Shared,
    Exclusive,
}

/// Runs `operation` while holding an advisory lock on `lock_path`. The lock file is created when
/// missing and is never removed.
pub async fn with_file_lock<T>(
    lock_path: &Path,
    kind: LockKind,
    operation: impl Future<Output = Result<T>>,
) -> Result<T> {
    let file = File::options()
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .await
        .with_context(|| format!("Failed to open lock file {lock_path:?}"))?;

    // Semi-safe acquire-release for a file
    match kind {
        LockKind::Shared => file.lock_shared()?,
        LockKind::Exclusive => file.lock_exclusive()?,
    }
    let result = operation.await;
    file.unlock_async().await?;
    result
}

/// Replaces `path` with `contents` so that readers see either the old or the new file, never a
/// partial write.
pub async fn write_atomically(path: &Path, contents: Vec<u8>) -> Result<()> {
    let path = path.to_owned();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let dir = path
            .parent()
            .with_context(|| format!("{path:?} has no parent directory"))?;
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(&contents)?;
        temp.as_file().sync_all()?;
        temp.persist(&path)?;
        Ok(())
    })
    .await?
}
