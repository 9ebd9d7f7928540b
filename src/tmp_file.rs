use std::{
    ops::Deref,
    path::{Path, PathBuf},
    sync::Arc,
};

use uuid::Uuid;

pub(crate) type ArcTmpDir = Arc<TmpDir>;

/// A per-process scratch directory, removed with everything in it when dropped
#[derive(Debug)]
pub(crate) struct TmpDir {
    path: Option<PathBuf>,
}

impl TmpDir {
    pub(crate) async fn init<P: AsRef<Path>>(path: P) -> std::io::Result<Arc<Self>> {
        let path = path.as_ref().join(Uuid::now_v7().to_string());
        tokio::fs::create_dir_all(&path).await?;
        Ok(Arc::new(TmpDir { path: Some(path) }))
    }

    pub(crate) fn path(&self) -> &Path {
        self.path.as_deref().expect("tmp path exists")
    }

    /// Reserve a path for a new temporary file
    ///
    /// The file itself is not created. Whatever ends up at the path is removed when the returned
    /// handle is dropped.
    pub(crate) fn tmp_file(&self, ext: Option<&str>) -> TmpFile {
        let name = match ext {
            Some(ext) => format!("{}{ext}", Uuid::now_v7()),
            None => Uuid::now_v7().to_string(),
        };

        TmpFile(Some(self.path().join(name)))
    }

    pub(crate) async fn cleanup(self: Arc<Self>) -> std::io::Result<()> {
        if let Some(path) = Arc::into_inner(self).and_then(|mut this| this.path.take()) {
            tokio::fs::remove_dir_all(path).await?;
        }

        Ok(())
    }
}

impl Drop for TmpDir {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_dir_all(&path) {
                tracing::warn!("Failed to remove temporary directory {path:?}: {e}");
            }
        }
    }
}

#[must_use]
#[derive(Debug)]
pub(crate) struct TmpFile(Option<PathBuf>);

impl TmpFile {
    pub(crate) async fn cleanup(mut self) -> std::io::Result<()> {
        if let Some(path) = self.0.take() {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }
}

impl AsRef<Path> for TmpFile {
    fn as_ref(&self) -> &Path {
        self
    }
}

impl Deref for TmpFile {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        self.0.as_deref().expect("tmp file path exists until cleanup")
    }
}

impl Drop for TmpFile {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}
