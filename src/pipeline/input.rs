//! Input acquisition: turn a path or URL into a local PDF file.
//!
//! Two entry points:
//!
//! * [`resolve_input`] — a path is validated in place, a URL is downloaded to
//!   a `TempDir` that lives as long as the returned [`ResolvedInput`].
//! * [`acquire`] — download a URL once to a fixed local destination; later
//!   runs reuse the file already on disk.
//!
//! Both check the `%PDF` magic bytes so a mis-served HTML error page is
//! reported as [`PdfRagError::NotAPdf`] rather than as a pdfium failure.

use crate::error::PdfRagError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// The resolved input — either a local path or a downloaded temp file.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; PDF downloaded to a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until the run completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Get the path to the PDF file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }

    /// File name used as the `source` metadata of every chunk.
    pub fn source_name(&self) -> String {
        self.path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path().display().to_string())
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local PDF file path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, PdfRagError> {
    if input.trim().is_empty() {
        return Err(PdfRagError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        let temp_dir = TempDir::new().map_err(|e| PdfRagError::Internal(e.to_string()))?;
        let file_path = temp_dir.path().join(filename_from_url(input));
        download_to(input, &file_path, timeout_secs).await?;
        Ok(ResolvedInput::Downloaded {
            path: file_path,
            _temp_dir: temp_dir,
        })
    } else {
        let path = PathBuf::from(input);
        validate_local(&path)?;
        debug!("Resolved local PDF: {}", path.display());
        Ok(ResolvedInput::Local(path))
    }
}

/// Download `url` to `dest` unless `dest` already exists.
///
/// Returns `dest` once it holds a file that starts with `%PDF`.
pub async fn acquire(url: &str, dest: &Path, timeout_secs: u64) -> Result<PathBuf, PdfRagError> {
    if dest.exists() {
        info!("Using cached PDF: {}", dest.display());
        validate_local(dest)?;
        return Ok(dest.to_path_buf());
    }
    if !is_url(url) {
        return Err(PdfRagError::InvalidInput {
            input: url.to_string(),
        });
    }
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PdfRagError::OutputWriteFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }
    download_to(url, dest, timeout_secs).await?;
    Ok(dest.to_path_buf())
}

/// Validate a local file: exists, readable, PDF magic bytes.
fn validate_local(path: &Path) -> Result<(), PdfRagError> {
    if !path.exists() {
        return Err(PdfRagError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(f) => {
            let mut head = Vec::with_capacity(4);
            f.take(4)
                .read_to_end(&mut head)
                .map_err(|e| PdfRagError::Internal(format!("read {}: {e}", path.display())))?;
            check_magic(path, &head)
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(PdfRagError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(PdfRagError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}

/// `head` must start with `%PDF`. Shorter input is zero-padded in the error.
fn check_magic(path: &Path, head: &[u8]) -> Result<(), PdfRagError> {
    if head.starts_with(b"%PDF") {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = head.len().min(4);
    magic[..n].copy_from_slice(&head[..n]);
    Err(PdfRagError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    })
}

/// Fetch `url` and write the body to `file_path`.
async fn download_to(url: &str, file_path: &Path, timeout_secs: u64) -> Result<(), PdfRagError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PdfRagError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            PdfRagError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            PdfRagError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(PdfRagError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| PdfRagError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    // Check before writing so a bad body never lands at a cached destination.
    check_magic(file_path, &bytes)?;

    tokio::fs::write(file_path, &bytes)
        .await
        .map_err(|e| PdfRagError::OutputWriteFailed {
            path: file_path.to_path_buf(),
            source: e,
        })?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());
    Ok(())
}

/// Extract a reasonable filename from the URL path.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://example.com/papers/attention.pdf"),
            "attention.pdf"
        );
        assert_eq!(
            filename_from_url("https://arxiv.org/pdf/1706.03762"),
            "1706.03762"
        );
        assert_eq!(filename_from_url("https://example.com/"), "downloaded.pdf");
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let result = resolve_input("/definitely/not/a/real/file.pdf", 5).await;
        assert!(matches!(result, Err(PdfRagError::FileNotFound { .. })));
    }

    #[tokio::test]
    async fn non_pdf_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"<html>not a pdf</html>").unwrap();

        let result = resolve_input(path.to_str().unwrap(), 5).await;
        assert!(matches!(result, Err(PdfRagError::NotAPdf { .. })));
    }

    #[tokio::test]
    async fn empty_and_truncated_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.pdf");
        std::fs::write(&empty, b"").unwrap();
        let short = dir.path().join("short.pdf");
        std::fs::write(&short, b"%P").unwrap();

        let err = resolve_input(empty.to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, PdfRagError::NotAPdf { magic: [0, 0, 0, 0], .. }));
        let err = resolve_input(short.to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, PdfRagError::NotAPdf { magic: [b'%', b'P', 0, 0], .. }));
    }

    #[test]
    fn short_download_body_is_not_a_pdf() {
        let dest = Path::new("downloaded.pdf");
        assert!(check_magic(dest, b"%PDF-1.7").is_ok());
        assert!(matches!(
            check_magic(dest, b""),
            Err(PdfRagError::NotAPdf { .. })
        ));
        assert!(matches!(
            check_magic(dest, b"%PD"),
            Err(PdfRagError::NotAPdf { magic: [b'%', b'P', b'D', 0], .. })
        ));
    }

    #[tokio::test]
    async fn acquire_reuses_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("cached.pdf");
        std::fs::write(&dest, b"%PDF-1.4\n%%EOF\n").unwrap();

        // The URL is unreachable; a cache hit must not touch the network.
        let path = acquire("https://invalid.invalid/doc.pdf", &dest, 1)
            .await
            .expect("cached file should be reused");
        assert_eq!(path, dest);
    }

    #[tokio::test]
    async fn acquire_rejects_non_url_source() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing.pdf");
        let result = acquire("not-a-url", &dest, 1).await;
        assert!(matches!(result, Err(PdfRagError::InvalidInput { .. })));
    }

    #[test]
    fn source_name_is_file_name() {
        let input = ResolvedInput::Local(PathBuf::from("/data/attention_is_all_you_need.pdf"));
        assert_eq!(input.source_name(), "attention_is_all_you_need.pdf");
    }
}
