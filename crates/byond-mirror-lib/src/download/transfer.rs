use std::io;
use std::path::Path;

/// Moves a finished download from `source` to `target`.
///
/// A plain rename is used when both live on one filesystem. Otherwise the file is copied
/// to a hidden sibling of `target` and renamed over, so `target` only ever appears complete.
/// Fails with [`io::ErrorKind::AlreadyExists`] when `target` exists.
pub async fn move_into_place(source: &Path, target: &Path) -> io::Result<()> {
    if tokio::fs::try_exists(target).await? {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", target.display()),
        ));
    }
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    match tokio::fs::rename(source, target).await {
        Ok(()) => return Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(err),
        Err(err) => {
            tracing::debug!(
                source = %source.display(),
                target = %target.display(),
                "Rename failed ({}), copying instead",
                err
            );
        }
    }

    let mut staging_name = std::ffi::OsString::from(".");
    staging_name.push(target.file_name().unwrap_or_default());
    staging_name.push(".moving");
    let staging = target.with_file_name(staging_name);

    if let Err(err) = tokio::fs::copy(source, &staging).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(err);
    }
    if let Err(err) = tokio::fs::rename(&staging, target).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(err);
    }
    tokio::fs::remove_file(source).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_move_into_place_renames() {
        let scratch = tempfile::tempdir().unwrap();
        let mirror = tempfile::tempdir().unwrap();
        let source = scratch.path().join("515.1630_byond.exe");
        let target = mirror.path().join("515").join("515.1630_byond.exe");
        std::fs::write(&source, b"installer").unwrap();

        move_into_place(&source, &target).await.unwrap();

        assert!(!source.exists());
        assert_eq!(std::fs::read(&target).unwrap(), b"installer");
    }

    #[tokio::test]
    async fn test_move_into_place_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scratch.exe");
        let target = dir.path().join("515.1630_byond.exe");
        std::fs::write(&source, b"new").unwrap();
        std::fs::write(&target, b"old").unwrap();

        let err = move_into_place(&source, &target).await.unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read(&target).unwrap(), b"old");
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_move_into_place_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("515.1630_byond.exe");

        assert!(
            move_into_place(&dir.path().join("missing"), &target)
                .await
                .is_err()
        );
        assert!(!target.exists());
    }
}
