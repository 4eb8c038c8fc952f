//! Image encoding for the vision OCR backend: image → base64 PNG `ImageData`.
//!
//! PNG keeps rendered glyph edges intact; JPEG artefacts on small print make
//! vision models misread characters. `detail: "high"` asks GPT-4-class models
//! for the full tile budget so footnotes and table cells stay legible.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Encode an in-memory image as a base64 PNG ready for the VLM API.
pub fn encode_image(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

/// Decode an image file and re-encode it for the VLM API.
///
/// Decoding first rejects truncated or non-image files before any request
/// is sent.
pub fn encode_file(path: &Path) -> Result<ImageData, image::ImageError> {
    let img = image::open(path)?;
    encode_image(&img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let data = encode_image(&img).expect("encode should succeed");
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert!(decoded.starts_with(b"\x89PNG"));
    }

    #[test]
    fn encode_file_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page_1.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(encode_file(&path).is_err());
    }
}
