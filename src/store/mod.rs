//! Durable JSON-backed stores.
//!
//! Each record is a small single-owner JSON document committed by writing a
//! temporary sibling and renaming it into place, so a crash mid-write never
//! leaves a partially written file observable by a later read.

pub mod assist;
pub mod ledger;

pub use assist::{AssistRecord, AssistState, AssistStore};
pub use ledger::ReplyLedger;

use std::path::Path;

/// Atomically replace `path` with `bytes` (write to `.tmp`, then rename).
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn write_atomic_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deep/file.json");
        write_atomic(&path, b"[]").await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"[]");
    }

    #[tokio::test]
    async fn write_atomic_replaces_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.json");
        write_atomic(&path, b"old").await.unwrap();
        write_atomic(&path, b"new").await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"new");
        // no stray temporary left behind
        assert!(!dir.path().join("file.tmp").exists());
    }
}
