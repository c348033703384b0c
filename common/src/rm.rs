use anyhow::{Context, Result, anyhow};
use async_recursion::async_recursion;
use tracing::instrument;

/// Removes `path` and, if it is a directory, everything beneath it.
///
/// Symlinks are removed, never followed. Directory children are removed concurrently and all
/// of them are attempted even if some fail.
#[instrument]
#[async_recursion]
pub async fn rm(path: &std::path::Path) -> Result<()> {
    tracing::debug!("remove: {:?}", path);
    let metadata = tokio::fs::symlink_metadata(path)
        .await
        .with_context(|| format!("failed reading metadata from {:?}", &path))?;
    if !metadata.is_dir() {
        return tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("failed removing {:?}", &path));
    }
    let mut entries = tokio::fs::read_dir(path)
        .await
        .with_context(|| format!("cannot open directory {:?} for reading", &path))?;
    let mut join_set = tokio::task::JoinSet::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("failed traversing directory {:?}", &path))?
    {
        let entry_path = entry.path();
        let do_rm = || async move { rm(&entry_path).await };
        join_set.spawn(do_rm());
    }
    // ReadDir holds a file descriptor, release it before waiting on the children
    drop(entries);
    let mut errors = vec![];
    while let Some(res) = join_set.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(error)) => errors.push(error),
            Err(error) => errors.push(error.into()),
        }
    }
    if !errors.is_empty() {
        tracing::debug!("remove: {:?} failed with: {:?}", path, &errors);
        return Err(anyhow!(
            "failed removing contents of {:?}: {}",
            path,
            errors
                .iter()
                .map(|error| format!("{error:#}"))
                .collect::<Vec<_>>()
                .join("; ")
        ));
    }
    tokio::fs::remove_dir(path)
        .await
        .with_context(|| format!("failed removing directory {:?}", &path))?;
    tracing::debug!("remove: {:?} succeeded!", path);
    Ok(())
}
