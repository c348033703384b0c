#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("path cannot be empty")]
    Empty,
    #[error("{0:?} is not a directory")]
    NotADirectory(std::path::PathBuf),
    #[error("cannot access {path:?}")]
    Inaccessible {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Checks that `path` names an existing directory, following symlinks.
pub fn validate_directory(path: &std::path::Path) -> Result<(), PathError> {
    if path.as_os_str().is_empty() {
        return Err(PathError::Empty);
    }
    let metadata = std::fs::metadata(path).map_err(|source| PathError::Inaccessible {
        path: path.to_owned(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(PathError::NotADirectory(path.to_owned()));
    }
    Ok(())
}
