use futures::StreamExt;
use reqwest::Client;
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::http;
use crate::manifest::Download;
use crate::paths::{ensure_dir, file_exists};

pub const DOWNLOAD_CONCURRENCY: usize = 12;

/// A file to fetch and where it belongs on disk.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub download: Download,
    pub path: PathBuf,
}

impl DownloadJob {
    pub fn new(download: Download, path: PathBuf) -> Self {
        Self { download, path }
    }
}

/// Skips the request when the file on disk already matches the expected hash
/// (or size, when no hash is known). New content is written next to the target
/// as `<name>.part` and only renamed into place once it has been verified.
pub async fn download_if_needed(
    client: &Client,
    download: &Download,
    path: &Path,
) -> Result<(), String> {
    if is_current(download, path) {
        return Ok(());
    }

    let partial = partial_path(path);
    if let Err(err) = fetch_verified(client, download, &partial).await {
        let _ = std::fs::remove_file(&partial);
        return Err(err);
    }
    std::fs::rename(&partial, path).map_err(|err| {
        let _ = std::fs::remove_file(&partial);
        format!("Failed to move download into {}: {err}", path.display())
    })
}

async fn fetch_verified(client: &Client, download: &Download, partial: &Path) -> Result<(), String> {
    download_to_file(client, &download.url, partial).await?;
    verify(download, partial)
}

fn verify(download: &Download, path: &Path) -> Result<(), String> {
    if let Some(size) = download.size {
        let actual = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        if actual != size {
            return Err(format!(
                "Download incomplete for {}: expected {size} bytes, got {actual} bytes",
                download.url
            ));
        }
    }

    if let Some(expected) = &download.sha1 {
        let actual = sha1_file(path)?;
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(format!(
                "Downloaded file hash mismatch for {}: expected {expected}, got {actual}",
                download.url
            ));
        }
    }
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Runs jobs with bounded concurrency and stops at the first failure.
pub async fn download_all(client: &Client, jobs: Vec<DownloadJob>, label: &str) -> Result<(), String> {
    let total = jobs.len();
    if total == 0 {
        return Ok(());
    }

    let mut stream = futures::stream::iter(jobs.into_iter().map(|job| {
        let client = client.clone();
        async move { download_if_needed(&client, &job.download, &job.path).await }
    }))
    .buffer_unordered(DOWNLOAD_CONCURRENCY);

    let mut done = 0usize;
    while let Some(result) = stream.next().await {
        result?;
        done += 1;
        if done % 50 == 0 || done == total {
            debug!("{label} {done}/{total}");
        }
    }
    Ok(())
}

fn is_current(download: &Download, path: &Path) -> bool {
    if !file_exists(path) {
        return false;
    }
    if let Some(expected) = &download.sha1 {
        return sha1_file(path)
            .map(|actual| actual.eq_ignore_ascii_case(expected))
            .unwrap_or(false);
    }
    let len = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    match download.size {
        Some(size) => len == size,
        // Nothing to check against; an empty file is never a finished download.
        None => len > 0,
    }
}

async fn download_to_file(client: &Client, url: &str, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let response = http::get(client, url)
        .await
        .map_err(|err| format!("Download failed: {err}"))?;

    let mut file = async_fs::File::create(path)
        .await
        .map_err(|err| format!("Failed to write file {}: {err}", path.display()))?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|err| format!("Failed to read download: {err}"))?;
        file.write_all(&bytes)
            .await
            .map_err(|err| format!("Failed to write file: {err}"))?;
    }

    file.flush()
        .await
        .map_err(|err| format!("Failed to flush download: {err}"))
}

pub(crate) fn sha1_file(path: &Path) -> Result<String, String> {
    let mut file =
        std::fs::File::open(path).map_err(|err| format!("Failed to open file: {err}"))?;
    let mut hasher = Sha1::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = std::io::Read::read(&mut file, &mut buffer)
            .map_err(|err| format!("Read failed: {err}"))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::shared_client;
    use crate::test_support::unique_temp_dir;

    fn download(sha1: Option<&str>, size: Option<u64>) -> Download {
        Download {
            path: None,
            url: "http://127.0.0.1:9/never".to_string(),
            sha1: sha1.map(ToString::to_string),
            size,
        }
    }

    #[test]
    fn sha1_file_hashes_contents() {
        let dir = unique_temp_dir("melon-sha1");
        std::fs::create_dir_all(&dir).expect("create dir");
        let path = dir.join("hello.txt");
        std::fs::write(&path, b"hello").expect("write");
        assert_eq!(
            sha1_file(&path).expect("hash"),
            "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
        );
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn existing_file_with_matching_hash_is_current() {
        let dir = unique_temp_dir("melon-current");
        std::fs::create_dir_all(&dir).expect("create dir");
        let path = dir.join("hello.txt");
        std::fs::write(&path, b"hello").expect("write");

        assert!(is_current(
            &download(Some("AAF4C61DDCC5E8A2DABEDE0F3B482CD9AEA9434D"), None),
            &path
        ));
        assert!(!is_current(&download(Some("deadbeef"), None), &path));
        assert!(is_current(&download(None, Some(5)), &path));
        assert!(!is_current(&download(None, Some(6)), &path));
        assert!(is_current(&download(None, None), &path));

        let empty = dir.join("empty.jar");
        std::fs::write(&empty, b"").expect("write");
        assert!(!is_current(&download(None, None), &empty));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_file_is_never_current() {
        let dir = unique_temp_dir("melon-missing");
        assert!(!is_current(&download(None, None), &dir.join("absent.jar")));
        let _ = std::fs::remove_dir_all(dir);
    }

    /// Answers one request with `response` and closes the connection.
    fn serve_once(response: &'static [u8]) -> (String, std::thread::JoinHandle<()>) {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let handle = std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = [0u8; 2048];
                let _ = std::io::Read::read(&mut stream, &mut request);
                let _ = std::io::Write::write_all(&mut stream, response);
            }
        });
        (format!("http://{addr}/file.jar"), handle)
    }

    #[tokio::test]
    async fn truncated_body_leaves_nothing_behind() {
        let (url, server) = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\n0123456789",
        );
        let dir = unique_temp_dir("melon-truncated");
        let path = dir.join("loader.jar");
        let job = Download {
            url,
            ..download(None, None)
        };

        assert!(download_if_needed(shared_client(), &job, &path).await.is_err());
        server.join().expect("server");
        assert!(!path.exists());
        assert!(!partial_path(&path).exists());
        assert!(!is_current(&job, &path));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn hash_mismatch_is_discarded() {
        let (url, server) = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhellp",
        );
        let dir = unique_temp_dir("melon-mismatch");
        let path = dir.join("client.jar");
        let job = Download {
            url,
            ..download(Some("aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"), Some(5))
        };

        let err = download_if_needed(shared_client(), &job, &path)
            .await
            .unwrap_err();
        server.join().expect("server");
        assert!(err.contains("hash mismatch"), "{err}");
        assert!(!path.exists());
        assert!(!partial_path(&path).exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn verified_download_is_moved_into_place() {
        let (url, server) = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
        );
        let dir = unique_temp_dir("melon-verified");
        let path = dir.join("libs").join("demo.jar");
        let job = Download {
            url,
            ..download(Some("aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"), Some(5))
        };

        download_if_needed(shared_client(), &job, &path)
            .await
            .expect("download");
        server.join().expect("server");
        assert_eq!(std::fs::read(&path).expect("read"), b"hello");
        assert!(!partial_path(&path).exists());
        let _ = std::fs::remove_dir_all(dir);
    }
}
