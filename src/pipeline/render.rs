//! PDF rasterisation: render every page to an image and save it as PNG.
//!
//! ## Failure policy: fail-fast-to-empty
//!
//! [`rasterize_pages`] never returns an error. If pdfium cannot be bound, the
//! document cannot be opened, any page fails to render or any PNG cannot be
//! written, the failure is logged at `error` and an **empty** vector comes
//! back. Partial results are discarded on purpose: downstream OCR works per
//! page, and a half-rendered document would silently drop pages from the
//! summary pass.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and is not safe to drive from async contexts. All pdfium work runs
//! on the blocking pool.

use crate::error::PdfRagError;
use crate::output::DocumentMetadata;
use image::{ColorType, DynamicImage, ImageFormat};
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Format, size and colour mode of a page image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDetails {
    /// Upper-case format name, e.g. `PNG`.
    pub format: String,
    pub width: u32,
    pub height: u32,
    /// Colour mode name, e.g. `RGB` or `L`.
    pub mode: String,
}

impl ImageDetails {
    /// Details of an in-memory image that is (or will be) saved as `format`.
    pub fn of_image(img: &DynamicImage, format: ImageFormat) -> Self {
        Self {
            format: format!("{:?}", format).to_uppercase(),
            width: img.width(),
            height: img.height(),
            mode: color_mode_name(img.color()).to_string(),
        }
    }

    /// Read details from an image on disk.
    pub fn read(path: &Path) -> Result<Self, image::ImageError> {
        let format = ImageFormat::from_path(path)?;
        let img = image::open(path)?;
        Ok(Self::of_image(&img, format))
    }
}

/// One rasterised page, already written to disk.
///
/// The bitmap itself is dropped once the PNG is saved; only its details are
/// kept.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Location of the saved PNG (`page_{page_num}.png`).
    pub path: PathBuf,
    pub details: ImageDetails,
}

/// Short colour-mode name for an image colour type.
pub fn color_mode_name(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 | ColorType::L16 => "L",
        ColorType::La8 | ColorType::La16 => "LA",
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => "RGB",
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => "RGBA",
        _ => "UNKNOWN",
    }
}

/// File name for a rendered page.
pub fn page_image_path(dir: &Path, page_num: usize) -> PathBuf {
    dir.join(format!("page_{page_num}.png"))
}

/// Bind to a pdfium shared library.
///
/// Resolution order: `PDFIUM_LIB_PATH` (file or directory), the current
/// directory, then the system library search path.
pub fn bind_pdfium() -> Result<Pdfium, PdfRagError> {
    if let Ok(configured) = std::env::var("PDFIUM_LIB_PATH") {
        let configured = PathBuf::from(configured);
        let lib = if configured.is_dir() {
            Pdfium::pdfium_platform_library_name_at_path(&configured)
        } else {
            configured
        };
        return Pdfium::bind_to_library(&lib)
            .map(Pdfium::new)
            .map_err(|e| PdfRagError::PdfiumBindingFailed(format!("{}: {:?}", lib.display(), e)));
    }

    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| PdfRagError::PdfiumBindingFailed(format!("{:?}", e)))
}

/// Open a document, mapping pdfium's error into password/corruption variants.
pub(crate) fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, PdfRagError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                PdfRagError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                PdfRagError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            PdfRagError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// Rasterise every page of a PDF and save each one as `page_{n}.png` in `out_dir`.
///
/// Returns pages in document order, or an empty vector if anything failed.
pub async fn rasterize_pages(
    pdf_path: &Path,
    out_dir: &Path,
    max_pixels: u32,
    password: Option<&str>,
) -> Vec<PageImage> {
    let path = pdf_path.to_path_buf();
    let dir = out_dir.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    let joined = tokio::task::spawn_blocking(move || {
        rasterize_pages_blocking(&path, &dir, max_pixels, pwd.as_deref())
    })
    .await;

    match joined {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => {
            error!("Error converting PDF to images: {}", e);
            Vec::new()
        }
        Err(e) => {
            error!("Render task panicked: {}", e);
            Vec::new()
        }
    }
}

/// Blocking implementation of page rendering.
fn rasterize_pages_blocking(
    pdf_path: &Path,
    out_dir: &Path,
    max_pixels: u32,
    password: Option<&str>,
) -> Result<Vec<PageImage>, PdfRagError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path, password)?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded for rendering: {} pages", total_pages);

    std::fs::create_dir_all(out_dir).map_err(|e| PdfRagError::OutputWriteFailed {
        path: out_dir.to_path_buf(),
        source: e,
    })?;

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut results = Vec::with_capacity(total_pages);

    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            PdfRagError::Internal(format!("Rasterisation failed for page {page_num}: {e:?}"))
        })?;

        let image = bitmap.as_image();
        let path = page_image_path(out_dir, page_num);
        image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| PdfRagError::OutputWriteFailed {
                path: path.clone(),
                source: std::io::Error::other(e),
            })?;
        let details = ImageDetails::of_image(&image, ImageFormat::Png);

        debug!(
            "Rendered page {} → {}x{} px {} → {}",
            page_num,
            details.width,
            details.height,
            details.mode,
            path.display()
        );

        results.push(PageImage {
            page_num,
            path,
            details,
        });
    }

    Ok(results)
}

/// Extract document metadata from a PDF without rendering pages.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, PdfRagError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_metadata_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| PdfRagError::Internal(format!("Metadata task panicked: {}", e)))?
}

fn extract_metadata_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, PdfRagError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path, password)?;

    let metadata = document.metadata();
    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}
