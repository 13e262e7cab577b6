//! Region masking — redacts rectangles on the source photo before it is
//! sent to the extraction service.
//!
//! Regions come from the clerk's drag selection, so corners may arrive in
//! any order and may hang over the image edge. Each region is normalized,
//! clipped, and solid-filled with white; the masked page is re-encoded as
//! PNG and that buffer is the only artifact callers may rely on.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use super::error::MaskError;

/// Fill color for redacted regions — white, matching the ledger paper.
const MASK_FILL: Rgb<u8> = Rgb([255, 255, 255]);

/// A rectangular region to redact, addressed by two opposite corners.
///
/// Coordinates may arrive in any order (a drag can start from any corner);
/// [`MaskRegion::normalized`] produces the `x1 <= x2, y1 <= y2` form every
/// consumer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskRegion {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl MaskRegion {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Copy with corners swapped into canonical order.
    pub fn normalized(self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }
}

/// Redact `regions` on the image, in list order. Later regions may overlap
/// and overwrite earlier ones; masking the same regions again is a no-op on
/// the already-masked result.
///
/// Returns freshly encoded PNG bytes. The source buffer should be treated as
/// consumed — only the returned buffer is the masked artifact.
pub fn mask_regions(image_bytes: &[u8], regions: &[MaskRegion]) -> Result<Vec<u8>, MaskError> {
    let decoded = image::load_from_memory(image_bytes)
        .map_err(|e| MaskError::ImageDecode(e.to_string()))?;
    let mut img = decoded.to_rgb8();

    for region in regions {
        fill_region(&mut img, region.normalized());
    }

    let mut out = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| MaskError::ImageEncode(e.to_string()))?;
    Ok(out)
}

/// Solid-fill one normalized region, clipped to the image extent. Corners are
/// inclusive. A region lying entirely outside the image fills nothing.
fn fill_region(img: &mut RgbImage, region: MaskRegion) {
    let (width, height) = img.dimensions();
    if region.x2 < 0
        || region.y2 < 0
        || region.x1 >= width as i32
        || region.y1 >= height as i32
    {
        return;
    }

    let x1 = region.x1.max(0) as u32;
    let y1 = region.y1.max(0) as u32;
    let x2 = (region.x2 as u32).min(width - 1);
    let y2 = (region.y2 as u32).min(height - 1);

    for y in y1..=y2 {
        for x in x1..=x2 {
            img.put_pixel(x, y, MASK_FILL);
        }
    }
}
