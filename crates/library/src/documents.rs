// FILE: crates/library/src/documents.rs
//! Local copies of imported PDFs

use crate::error::{LibraryError, LibraryResult};
use crate::persistence::file_stem;
use hearlearn_core::BookId;
use log::{debug, info};
use std::io;
use std::path::{Path, PathBuf};

/// Directory holding one `<id>.pdf` per imported book
#[derive(Debug, Clone)]
pub struct DocumentCache {
    dir: PathBuf,
}

impl DocumentCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &BookId) -> PathBuf {
        self.dir.join(format!("{}.pdf", file_stem(id.as_str())))
    }

    /// Copies `source` into the cache and returns the cached path
    pub async fn store(&self, source: &Path, id: &BookId) -> LibraryResult<PathBuf> {
        if !tokio::fs::try_exists(source).await? {
            return Err(LibraryError::FileNotFound(source.display().to_string()));
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let target = self.path_for(id);
        tokio::fs::copy(source, &target).await?;

        info!("Cached {} at {}", source.display(), target.display());
        Ok(target)
    }

    /// Deletes a cached document. A missing file is not an error.
    pub async fn discard(&self, path: &Path) -> LibraryResult<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!("Removed cached document {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LibraryError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_and_discard() -> LibraryResult<()> {
        let temp = TempDir::new()?;
        let source = temp.path().join("picked.pdf");
        std::fs::write(&source, b"%PDF")?;

        let cache = DocumentCache::new(temp.path().join("documents"));
        let id = BookId::new("abc");
        let cached = cache.store(&source, &id).await?;

        assert_eq!(cached, cache.dir().join("abc.pdf"));
        assert_eq!(std::fs::read(&cached)?, b"%PDF");
        assert!(source.exists());

        cache.discard(&cached).await?;
        assert!(!cached.exists());
        cache.discard(&cached).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_store_missing_source() -> LibraryResult<()> {
        let temp = TempDir::new()?;
        let cache = DocumentCache::new(temp.path());

        let result = cache
            .store(&temp.path().join("missing.pdf"), &BookId::new("abc"))
            .await;
        assert!(matches!(result, Err(LibraryError::FileNotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_similar_ids_get_separate_copies() -> LibraryResult<()> {
        let temp = TempDir::new()?;
        let source = temp.path().join("picked.pdf");
        std::fs::write(&source, b"%PDF")?;
        let cache = DocumentCache::new(temp.path().join("documents"));

        let slashed = cache.store(&source, &BookId::new("a/b")).await?;
        let underscored = cache.store(&source, &BookId::new("a_b")).await?;
        assert_ne!(slashed, underscored);

        cache.discard(&slashed).await?;
        assert!(underscored.exists());
        Ok(())
    }

    #[test]
    fn test_ids_cannot_escape_directory() {
        let cache = DocumentCache::new("/docs");
        let path = cache.path_for(&BookId::new("../secret"));
        assert_eq!(path.parent(), Some(Path::new("/docs")));
    }
}
