//! Page rasterisation and the slice plan.
//!
//! ## Why slice at all?
//!
//! Scanned long-scroll pages can be tens of thousands of points tall.
//! Rendering them at 3× and handing the whole strip to the engine produces
//! enormous bitmaps and degrades recognition. Instead each page is carved
//! into fixed-height horizontal bands with a small overlap, so no glyph is
//! truncated at a band boundary; the engine sees one modest bitmap at a time.
//!
//! ## Render once, crop per tile
//!
//! The page is rasterised once at the configured magnification and tile
//! bands are cropped out of the page raster. Tile pixel content, coverage,
//! and ordering are identical to clipping each region through pdfium, but
//! the renderer runs once per page instead of once per tile.

use crate::error::Ocr2TextError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// A tile's vertical extent in logical page units: `[y0, y1)`.
pub type SliceRange = (f32, f32);

/// Compute the slice plan for a page of height `page_height`.
///
/// Ranges are `[y, min(y + slice_height, page_height))` for
/// `y = 0, S−O, 2(S−O), …`; the tile whose lower edge reaches the page
/// bottom is the last. A page no taller than `slice_height` yields exactly
/// one tile; a degenerate page (height ≤ 0) yields none.
///
/// The union of the returned ranges covers `[0, page_height)` with no gaps,
/// and the plan has at most `⌈page_height / (slice_height − overlap)⌉`
/// entries. Callers guarantee `overlap < slice_height` (builder-validated),
/// so the loop always advances.
pub fn slice_ranges(page_height: f32, slice_height: f32, overlap: f32) -> Vec<SliceRange> {
    let mut ranges = Vec::new();
    if page_height <= 0.0 {
        return ranges;
    }

    let mut y = 0.0f32;
    loop {
        let y1 = (y + slice_height).min(page_height);
        ranges.push((y, y1));
        if y1 >= page_height {
            break;
        }
        y += slice_height - overlap;
    }
    ranges
}

/// Map a logical slice range onto a pixel band of the rendered page.
///
/// The band is clamped to the bitmap and always at least one pixel tall so
/// rounding at the page bottom never produces an empty crop.
pub fn pixel_band(range: SliceRange, magnification: f32, bitmap_height: u32) -> (u32, u32) {
    let top = ((range.0 * magnification).floor().max(0.0) as u32).min(bitmap_height - 1);
    let bottom = ((range.1 * magnification).ceil() as u32).clamp(top + 1, bitmap_height);
    (top, bottom)
}

/// Open a PDF document, mapping pdfium errors onto [`Ocr2TextError`].
pub fn open_pdf<'a>(
    pdfium: &'a Pdfium,
    path: &Path,
) -> Result<PdfDocument<'a>, Ocr2TextError> {
    pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| Ocr2TextError::CorruptDocument {
            path: path.to_path_buf(),
            detail: format!("{e:?}"),
        })
}

/// Rasterise one page at `magnification×` its logical size.
pub fn render_page(
    page: &PdfPage<'_>,
    page_num: usize,
    magnification: f32,
) -> Result<DynamicImage, Ocr2TextError> {
    let width_px = (page.width().value * magnification).round() as i32;
    let height_px = (page.height().value * magnification).round() as i32;

    let render_config = PdfRenderConfig::new()
        .set_target_width(width_px)
        .set_target_height(height_px);

    let bitmap =
        page.render_with_config(&render_config)
            .map_err(|e| Ocr2TextError::RenderFailed {
                page: page_num,
                detail: format!("{e:?}"),
            })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        page_num,
        image.width(),
        image.height()
    );
    Ok(image)
}

/// Crop one tile's band out of the rendered page.
pub fn crop_tile(page_image: &DynamicImage, range: SliceRange, magnification: f32) -> DynamicImage {
    let (top, bottom) = pixel_band(range, magnification, page_image.height());
    page_image.crop_imm(0, top, page_image.width(), bottom - top)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_page_yields_single_tile() {
        let ranges = slice_ranges(800.0, 1500.0, 100.0);
        assert_eq!(ranges, vec![(0.0, 800.0)]);
    }

    #[test]
    fn page_exactly_slice_height_yields_single_tile() {
        let ranges = slice_ranges(1500.0, 1500.0, 100.0);
        assert_eq!(ranges, vec![(0.0, 1500.0)]);
    }

    #[test]
    fn tall_page_advances_by_stride() {
        let ranges = slice_ranges(4000.0, 1500.0, 100.0);
        assert_eq!(
            ranges,
            vec![(0.0, 1500.0), (1400.0, 2900.0), (2800.0, 4000.0)]
        );
    }

    #[test]
    fn degenerate_page_yields_no_tiles() {
        assert!(slice_ranges(0.0, 1500.0, 100.0).is_empty());
        assert!(slice_ranges(-5.0, 1500.0, 100.0).is_empty());
    }

    #[test]
    fn plan_covers_page_without_gaps() {
        for &h in &[1.0f32, 999.0, 1500.0, 1501.0, 2900.0, 10_000.0, 33_333.0] {
            let ranges = slice_ranges(h, 1500.0, 100.0);
            assert_eq!(ranges.first().unwrap().0, 0.0, "height {h}");
            assert_eq!(ranges.last().unwrap().1, h, "height {h}");
            for pair in ranges.windows(2) {
                // Next tile starts inside the previous one (overlap ≥ gap-free).
                assert!(pair[1].0 <= pair[0].1, "gap at height {h}: {pair:?}");
                assert!(pair[1].0 > pair[0].0, "no advance at height {h}");
            }
        }
    }

    #[test]
    fn plan_length_is_bounded() {
        let (s, o) = (1500.0f32, 100.0f32);
        for &h in &[1.0f32, 1500.0, 1501.0, 4200.0, 100_000.0] {
            let ranges = slice_ranges(h, s, o);
            let bound = (h / (s - o)).ceil() as usize;
            assert!(
                ranges.len() <= bound.max(1),
                "height {h}: {} tiles > bound {bound}",
                ranges.len()
            );
        }
    }

    #[test]
    fn pixel_band_maps_and_clamps() {
        // 1000-point page at 3× → 3000 px bitmap.
        assert_eq!(pixel_band((0.0, 500.0), 3.0, 3000), (0, 1500));
        assert_eq!(pixel_band((400.0, 1000.0), 3.0, 3000), (1200, 3000));
        // Rounding at the page bottom never exceeds the bitmap.
        assert_eq!(pixel_band((999.9, 1000.0), 3.0, 3000), (2999, 3000));
    }

    #[test]
    fn pixel_band_is_never_empty() {
        let (top, bottom) = pixel_band((100.0, 100.0), 3.0, 500);
        assert!(bottom > top);
    }

    #[test]
    fn crop_tile_extracts_band() {
        let img = DynamicImage::new_rgba8(30, 300);
        let tile = crop_tile(&img, (0.0, 50.0), 2.0);
        assert_eq!(tile.width(), 30);
        assert_eq!(tile.height(), 100);
    }
}
