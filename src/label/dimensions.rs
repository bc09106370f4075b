//! Natural image size from file headers
//!
//! Raster formats are read with the `imagesize` crate; SVG sizes come from
//! the viewBox or the width/height attributes. Raster sizes are in pixels,
//! SVG sizes in user units; only the aspect ratio matters to the caller.

use std::path::Path;

use thiserror::Error;

/// Errors that can occur while reading an image size
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported image format")]
    UnsupportedFormat,

    #[error("malformed {format} header")]
    Malformed { format: &'static str },

    #[error("image size {width} x {height} is not a positive finite size")]
    InvalidSize { width: f64, height: f64 },
}

/// Read the natural (width, height) of an image file
pub fn image_dimensions(path: &Path) -> Result<(f64, f64), ImageError> {
    let bytes = std::fs::read(path)?;
    let (width, height) = dimensions_from_bytes(&bytes)?;
    if !is_positive_size(width) || !is_positive_size(height) {
        return Err(ImageError::InvalidSize { width, height });
    }
    Ok((width, height))
}

/// Whether `value` can be used as one side of a picture
pub(crate) fn is_positive_size(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn dimensions_from_bytes(bytes: &[u8]) -> Result<(f64, f64), ImageError> {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(4096)]);
    if head.contains("<svg") {
        return parse_svg_dimensions(&head).ok_or(ImageError::Malformed { format: "SVG" });
    }
    match imagesize::blob_size(bytes) {
        Ok(size) => Ok((size.width as f64, size.height as f64)),
        Err(imagesize::ImageError::NotSupported) => Err(ImageError::UnsupportedFormat),
        Err(imagesize::ImageError::CorruptedImage) => Err(ImageError::Malformed { format: "image" }),
        Err(imagesize::ImageError::IoError(e)) => Err(ImageError::Io(e)),
    }
}

/// Parse SVG dimensions from the viewBox, falling back to width/height
fn parse_svg_dimensions(svg: &str) -> Option<(f64, f64)> {
    if let Some(vb_start) = svg.find("viewBox=\"") {
        let vb_start = vb_start + 9;
        if let Some(vb_end) = svg[vb_start..].find('"') {
            let parts: Vec<f64> = svg[vb_start..vb_start + vb_end]
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter_map(|s| s.parse().ok())
                .collect();
            if parts.len() >= 4 {
                return Some((parts[2], parts[3]));
            }
        }
    }

    match (parse_svg_attribute(svg, "width"), parse_svg_attribute(svg, "height")) {
        (Some(w), Some(h)) => Some((w, h)),
        _ => None,
    }
}

/// Parse a numeric attribute, ignoring unit suffixes like px or pt
fn parse_svg_attribute(svg: &str, attr: &str) -> Option<f64> {
    let pattern = format!(" {}=\"", attr);
    let start = svg.find(&pattern)? + pattern.len();
    let end = svg[start..].find('"')?;
    let numeric: String = svg[start..start + end]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    numeric.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
        bytes
    }

    fn write(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_png() {
        assert_eq!(dimensions_from_bytes(&png_header(640, 480)).unwrap(), (640.0, 480.0));
    }

    #[test]
    fn test_gif() {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&300u16.to_le_bytes());
        bytes.extend_from_slice(&100u16.to_le_bytes());
        bytes.extend_from_slice(&[0, 0, 0]);
        assert_eq!(dimensions_from_bytes(&bytes).unwrap(), (300.0, 100.0));
    }

    #[test]
    fn test_svg_viewbox() {
        let svg = br#"<svg viewBox="0 0 100 50" xmlns="http://www.w3.org/2000/svg"></svg>"#;
        assert_eq!(dimensions_from_bytes(svg).unwrap(), (100.0, 50.0));
    }

    #[test]
    fn test_svg_width_height_with_units() {
        let svg = br#"<svg width="200px" height="100px" xmlns="http://www.w3.org/2000/svg"></svg>"#;
        assert_eq!(dimensions_from_bytes(svg).unwrap(), (200.0, 100.0));
    }

    #[test]
    fn test_svg_without_size() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"></svg>"#;
        assert!(matches!(
            dimensions_from_bytes(svg),
            Err(ImageError::Malformed { format: "SVG" })
        ));
    }

    #[test]
    fn test_unknown_format() {
        assert!(matches!(
            dimensions_from_bytes(b"plain text, certainly not an image"),
            Err(ImageError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_zero_sized_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "empty.png", &png_header(0, 10));
        assert!(matches!(
            image_dimensions(&path),
            Err(ImageError::InvalidSize { width, .. }) if width == 0.0
        ));
    }

    #[test]
    fn test_nan_viewbox_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "nan.svg",
            br#"<svg viewBox="0 0 NaN 10" xmlns="http://www.w3.org/2000/svg"></svg>"#,
        );
        assert!(matches!(image_dimensions(&path), Err(ImageError::InvalidSize { .. })));
    }

    #[test]
    fn test_infinite_viewbox_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "inf.svg",
            br#"<svg viewBox="0 0 10 inf" xmlns="http://www.w3.org/2000/svg"></svg>"#,
        );
        assert!(matches!(image_dimensions(&path), Err(ImageError::InvalidSize { .. })));
    }

    #[test]
    fn test_positive_size() {
        assert!(is_positive_size(1.5));
        assert!(!is_positive_size(0.0));
        assert!(!is_positive_size(-3.0));
        assert!(!is_positive_size(f64::NAN));
        assert!(!is_positive_size(f64::INFINITY));
    }
}
