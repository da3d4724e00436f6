use eyre::{Result, WrapErr, bail};
use futures::StreamExt;
use opendal::Operator;
use opendal::layers::TracingLayer;
use opendal::services::Http;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use url::{Position, Url};

/// Size of the blocks written to disk while streaming a response body.
pub const DOWNLOAD_CHUNK_SIZE: usize = 8192;

pub fn build_http_operator(base_url: &str) -> Result<Operator> {
    // Build an OpenDAL HTTP service for the given host.
    // Paths below it are fetched relative to the endpoint.
    let builder = Http::default().endpoint(base_url);

    let op = Operator::new(builder)?.layer(TracingLayer).finish();
    Ok(op)
}

/// Splits a file URL into the operator endpoint (`scheme://host[:port]`) and the path below it.
///
/// The path is returned decoded; the operator applies its own percent-encoding.
pub fn split_download_url(url: &Url) -> Result<(String, String)> {
    let path = urlencoding::decode(url.path())
        .wrap_err_with(|| format!("Download path is not valid UTF-8: {}", url))?;
    Ok((url[..Position::BeforePath].to_string(), path.into_owned()))
}

/// Streams `rel_path` into `output_path`, returning the number of bytes written.
///
/// The body goes to a `.part` sibling first and is renamed into place once complete, so a
/// failed transfer never leaves anything at `output_path`. An existing `output_path` is
/// never overwritten.
pub async fn stream_to_file(op: &Operator, rel_path: &str, output_path: &Path) -> Result<u64> {
    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .wrap_err_with(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    if tokio::fs::try_exists(output_path).await.unwrap_or(true) {
        bail!("Refusing to overwrite {}", output_path.display());
    }

    let partial_path = partial_path_for(output_path);
    let written = match write_body(op, rel_path, &partial_path).await {
        Ok(0) => {
            remove_partial(&partial_path).await;
            bail!("Empty response body for {}", rel_path);
        }
        Ok(written) => written,
        Err(err) => {
            remove_partial(&partial_path).await;
            return Err(err);
        }
    };

    if let Err(err) = tokio::fs::rename(&partial_path, output_path).await {
        remove_partial(&partial_path).await;
        return Err(err).wrap_err_with(|| {
            format!("Failed to move download into {}", output_path.display())
        });
    }

    Ok(written)
}

async fn write_body(op: &Operator, rel_path: &str, partial_path: &Path) -> Result<u64> {
    let mut reader = op
        .reader(rel_path)
        .await
        .wrap_err_with(|| format!("Failed to create reader for {}", rel_path))?
        .into_stream(..)
        .await
        .wrap_err_with(|| format!("Failed to create reader for {}", rel_path))?;

    let file = tokio::fs::File::create(partial_path)
        .await
        .wrap_err_with(|| format!("Failed to create output file: {}", partial_path.display()))?;
    let mut writer = tokio::io::BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);

    let mut written = 0u64;
    while let Some(chunk) = reader.next().await {
        let buffer = chunk
            .wrap_err_with(|| format!("Failed to read from {}", rel_path))?
            .to_bytes();

        writer
            .write_all(&buffer)
            .await
            .wrap_err_with(|| format!("Failed to write to {}", partial_path.display()))?;
        written += buffer.len() as u64;
    }

    writer
        .flush()
        .await
        .wrap_err_with(|| format!("Failed to flush {}", partial_path.display()))?;

    Ok(written)
}

fn partial_path_for(output_path: &Path) -> PathBuf {
    let mut name = output_path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    output_path.with_file_name(name)
}

async fn remove_partial(partial_path: &Path) {
    if let Err(err) = tokio::fs::remove_file(partial_path).await
        && err.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %partial_path.display(), "Failed to remove partial download: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_download_url_decodes_path() {
        let url = Url::parse("https://www.byond.com/download/build/515/515.1630 byond%23.exe").unwrap();

        let (endpoint, path) = split_download_url(&url).unwrap();

        assert_eq!(endpoint, "https://www.byond.com");
        assert_eq!(path, "/download/build/515/515.1630 byond#.exe");
    }

    #[test]
    fn test_split_download_url_keeps_port() {
        let url = Url::parse("http://127.0.0.1:8080/download/build/515/515.1630_byond.exe").unwrap();

        assert_eq!(
            split_download_url(&url).unwrap(),
            (
                "http://127.0.0.1:8080".to_string(),
                "/download/build/515/515.1630_byond.exe".to_string()
            )
        );
    }

    #[test]
    fn test_partial_path_is_a_sibling() {
        assert_eq!(
            partial_path_for(Path::new("public/515/515.1630_byond.exe")),
            PathBuf::from("public/515/515.1630_byond.exe.part")
        );
    }

    #[tokio::test]
    async fn test_stream_to_file_refuses_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("515.1630_byond.exe");
        std::fs::write(&target, b"original").unwrap();
        let op = build_http_operator("http://127.0.0.1:9").unwrap();

        let result = stream_to_file(&op, "/515.1630_byond.exe", &target).await;

        assert!(result.is_err());
        assert_eq!(std::fs::read(&target).unwrap(), b"original");
    }

    #[tokio::test]
    async fn test_stream_to_file_leaves_nothing_behind_on_connection_failure() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("515.1630_byond.exe");
        // Port 9 (discard) is not expected to accept HTTP connections.
        let op = build_http_operator("http://127.0.0.1:9").unwrap();

        let result = stream_to_file(&op, "/515.1630_byond.exe", &target).await;

        assert!(result.is_err());
        assert!(!target.exists());
        assert!(!partial_path_for(&target).exists());
    }
}
