//! Filesystem adapter consumed by the sync engines
//!
//! The engines never touch the filesystem directly, every read and write goes through the
//! [`FileOps`] trait. [`LocalFileOps`] is the implementation backed by `tokio::fs`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::os::unix::fs::PermissionsExt;
use tracing::instrument;

use crate::filecmp;
use crate::rm;

/// Directory entry as reported by the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: std::ffi::OsString,
    /// File type of the entry itself, symlinks are not followed
    pub is_dir: bool,
}

#[async_trait]
pub trait FileOps: Send + Sync {
    /// Checks whether `path` exists. "Not found" is `Ok(false)`, any other failure is an error.
    async fn exists(&self, path: &std::path::Path) -> Result<bool>;

    /// Lists the entries of directory `path` in the order returned by the filesystem.
    async fn read_directory(&self, path: &std::path::Path) -> Result<Vec<DirEntry>>;

    /// Creates directory `dst` with the permission mode of directory `src`.
    async fn recreate_directory(&self, src: &std::path::Path, dst: &std::path::Path)
    -> Result<()>;

    /// Equality verdict for two files based on metadata only.
    async fn is_the_same(&self, src: &std::path::Path, dst: &std::path::Path) -> Result<bool>;

    /// Copies the content of `src` into `dst` (overwriting it) and gives `dst` the timestamps
    /// of `src`.
    async fn copy_file(&self, src: &std::path::Path, dst: &std::path::Path) -> Result<()>;

    /// Removes `path` together with everything beneath it. A missing path is not an error.
    async fn delete_all(&self, path: &std::path::Path) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileOps {
    compare: filecmp::MetadataCmpSettings,
}

impl LocalFileOps {
    #[must_use]
    pub fn new(compare: filecmp::MetadataCmpSettings) -> Self {
        Self { compare }
    }
}

#[async_trait]
impl FileOps for LocalFileOps {
    #[instrument]
    async fn exists(&self, path: &std::path::Path) -> Result<bool> {
        match tokio::fs::metadata(path).await {
            Ok(_) => Ok(true),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(error) => {
                Err(error).with_context(|| format!("failed reading metadata from {:?}", &path))
            }
        }
    }

    #[instrument]
    async fn read_directory(&self, path: &std::path::Path) -> Result<Vec<DirEntry>> {
        let mut entries = tokio::fs::read_dir(path)
            .await
            .with_context(|| format!("cannot open directory {:?} for reading", &path))?;
        let mut result = vec![];
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("failed traversing directory {:?}", &path))?
        {
            let file_type = entry
                .file_type()
                .await
                .with_context(|| format!("failed reading file type of {:?}", entry.path()))?;
            result.push(DirEntry {
                name: entry.file_name(),
                is_dir: file_type.is_dir(),
            });
        }
        Ok(result)
    }

    #[instrument]
    async fn recreate_directory(
        &self,
        src: &std::path::Path,
        dst: &std::path::Path,
    ) -> Result<()> {
        let src_metadata = tokio::fs::metadata(src)
            .await
            .with_context(|| format!("failed reading metadata from {:?}", &src))?;
        let mode = src_metadata.permissions().mode() & 0o7777;
        let mut builder = tokio::fs::DirBuilder::new();
        builder.mode(mode);
        builder
            .create(dst)
            .await
            .with_context(|| format!("cannot create directory {:?}", &dst))
    }

    #[instrument]
    async fn is_the_same(&self, src: &std::path::Path, dst: &std::path::Path) -> Result<bool> {
        let src_metadata = tokio::fs::metadata(src)
            .await
            .with_context(|| format!("failed reading metadata from {:?}", &src))?;
        let dst_metadata = tokio::fs::metadata(dst)
            .await
            .with_context(|| format!("failed reading metadata from {:?}", &dst))?;
        Ok(filecmp::metadata_equal(
            &self.compare,
            &src_metadata,
            &dst_metadata,
        ))
    }

    #[instrument]
    async fn copy_file(&self, src: &std::path::Path, dst: &std::path::Path) -> Result<()> {
        let mut reader = tokio::fs::File::open(src)
            .await
            .with_context(|| format!("cannot open {:?} for reading", &src))?;
        // read the timestamps before the copy, reading the content may bump atime
        let src_metadata = reader
            .metadata()
            .await
            .with_context(|| format!("failed reading metadata from {:?}", &src))?;
        let mut writer = tokio::fs::File::create(dst)
            .await
            .with_context(|| format!("cannot open {:?} for writing", &dst))?;
        tracing::debug!("copying data");
        tokio::io::copy(&mut reader, &mut writer)
            .await
            .with_context(|| format!("failed copying {:?} to {:?}", &src, &dst))?;
        drop(writer);
        tracing::debug!("setting timestamps");
        let atime = filetime::FileTime::from_last_access_time(&src_metadata);
        let mtime = filetime::FileTime::from_last_modification_time(&src_metadata);
        let dst = dst.to_owned();
        tokio::task::spawn_blocking(move || {
            filetime::set_file_times(&dst, atime, mtime)
                .with_context(|| format!("failed setting timestamps for {:?}", &dst))
        })
        .await?
    }

    #[instrument]
    async fn delete_all(&self, path: &std::path::Path) -> Result<()> {
        match tokio::fs::symlink_metadata(path).await {
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            _ => rm::rm(path).await,
        }
    }
}
