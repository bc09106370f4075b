//! Image label
//!
//! The picture is scaled to fill the usable page area along its constraining
//! dimension: an image relatively wider than the area takes the full usable
//! width, otherwise the full usable height. The aspect ratio is kept, so the
//! picture never overflows the page in either direction.

use std::path::PathBuf;

use serde_json::Value;

use crate::document::{Alignment, Document, Paragraph, Picture, Run};
use crate::template::InsertionPoint;

use super::dimensions::{image_dimensions, is_positive_size};
use super::{placeholder_paragraph, ApplyError};

/// Parsed value of an image label: `[description or null, path]`
#[derive(Debug, Clone, PartialEq)]
pub struct ImageValue {
    /// Caption text; without one the placeholder paragraph is removed
    pub description: Option<String>,
    pub path: PathBuf,
}

impl ImageValue {
    pub fn parse(value: &Value) -> Option<Self> {
        match value.as_array()?.as_slice() {
            [description, path] => {
                let description = match description {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    _ => return None,
                };
                Some(Self {
                    description,
                    path: PathBuf::from(path.as_str()?),
                })
            }
            _ => None,
        }
    }
}

/// Scale `image` (width, height) to fill `area` along one dimension
pub fn fit_to_area(image: (f64, f64), area: (f64, f64)) -> (f64, f64) {
    let (image_width, image_height) = image;
    let (area_width, area_height) = area;
    if image_width / image_height >= area_width / area_height {
        (area_width, area_width * image_height / image_width)
    } else {
        (area_height * image_width / image_height, area_height)
    }
}

/// Insert a picture paragraph before the placeholder; the placeholder turns
/// into a centered caption, or is removed when there is no description
pub(super) fn insert_image(
    point: &InsertionPoint,
    document: &mut Document,
    image: &ImageValue,
) -> Result<(), ApplyError> {
    let style = placeholder_paragraph(point, document)?.style.clone();
    let area = (document.page.usable_width(), document.page.usable_height());
    if !is_positive_size(area.0) || !is_positive_size(area.1) {
        return Err(ApplyError::PageTooSmall {
            token: point.token.clone(),
            width: area.0,
            height: area.1,
        });
    }
    let natural = image_dimensions(&image.path).map_err(|source| ApplyError::Image {
        token: point.token.clone(),
        path: image.path.clone(),
        source,
    })?;
    let (width, height) = fit_to_area(natural, area);

    let mut picture = Paragraph::from_runs(vec![Run::picture(Picture {
        path: image.path.clone(),
        width,
        height,
    })]);
    picture.style = style;
    document.insert_before(point.paragraph, picture);

    match &image.description {
        None => {
            document.remove(point.paragraph);
        }
        Some(description) => {
            if let Some(caption) = document.paragraph_mut(point.paragraph) {
                caption.set_text(description.as_str());
                caption.style.alignment = Some(Alignment::Center);
            }
        }
    }
    Ok(())
}
