//! Figure detection from outer contours.

use crate::imaging::{ImageAnalysis, InkMap};
use crate::model::PixelRect;
use crate::options::SegmentParams;

/// Regions that are figures: framed regions (a contour enclosing a hole)
/// larger than the minimum figure size, or regions containing a figure
/// label anchor.
pub fn detect_figures(
    backend: &dyn ImageAnalysis,
    ink: &InkMap,
    anchors: &[(u32, u32)],
    p: &SegmentParams,
) -> Vec<PixelRect> {
    let figures: Vec<PixelRect> = backend
        .outer_contours(ink)
        .into_iter()
        .filter(|c| {
            let (w, h) = (c.rect.width(), c.rect.height());
            let framed = c.has_child && w > p.figure_min_width && h > p.figure_min_height;
            let anchored = w >= p.anchor_min_size
                && h >= p.anchor_min_size
                && anchors.iter().any(|&(x, y)| c.rect.contains_point(x, y));
            framed || anchored
        })
        .map(|c| c.rect)
        .collect();

    log::debug!("Detected {} figures", figures.len());
    figures
}
