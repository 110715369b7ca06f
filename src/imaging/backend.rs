//! Default image analysis backend built on `image` and `imageproc`.

use super::{morphology, ContourBox, ImageAnalysis, InkMap, INK};
use crate::model::PixelRect;
use image::{GrayImage, Luma, RgbaImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::contrast::otsu_level;

/// [`ImageAnalysis`] implementation using Otsu thresholding, separable
/// rectangular morphology and `imageproc` border following.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageprocBackend;

impl ImageprocBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ImageAnalysis for ImageprocBackend {
    fn grayscale(&self, image: &RgbaImage) -> GrayImage {
        GrayImage::from_fn(image.width(), image.height(), |x, y| {
            let [r, g, b, a] = image.get_pixel(x, y).0;
            let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000;
            // Composite over white
            let a = a as u32;
            Luma([((luma * a + 255 * (255 - a)) / 255) as u8])
        })
    }

    fn binarize(&self, gray: &GrayImage, threshold: Option<u8>) -> InkMap {
        let (min, max) = gray
            .pixels()
            .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
        if gray.width() == 0 || gray.height() == 0 || (threshold.is_none() && min == max) {
            return InkMap::new(gray.width(), gray.height());
        }

        let level = threshold.unwrap_or_else(|| otsu_level(gray));
        log::trace!("binarize: level {} (range {}..={})", level, min, max);

        let image = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            Luma([if gray.get_pixel(x, y)[0] <= level { INK } else { 0 }])
        });
        InkMap::from_gray(image)
    }

    fn open(&self, ink: &InkMap, width: u32, height: u32) -> InkMap {
        morphology::open(ink, width, height)
    }

    fn close(&self, ink: &InkMap, width: u32, height: u32) -> InkMap {
        morphology::close(ink, width, height)
    }

    fn outer_contours(&self, ink: &InkMap) -> Vec<ContourBox> {
        let contours: Vec<Contour<u32>> = find_contours(ink.as_image());

        let mut has_child = vec![false; contours.len()];
        for contour in &contours {
            if let Some(parent) = contour.parent {
                has_child[parent] = true;
            }
        }

        contours
            .iter()
            .enumerate()
            .filter(|(_, c)| c.border_type == BorderType::Outer && c.parent.is_none())
            .filter_map(|(i, c)| {
                let rect = bounding_box(c)?;
                Some(ContourBox {
                    rect,
                    has_child: has_child[i],
                })
            })
            .collect()
    }
}

fn bounding_box(contour: &Contour<u32>) -> Option<PixelRect> {
    let first = contour.points.first()?;
    let (mut l, mut t, mut r, mut b) = (first.x, first.y, first.x, first.y);
    for p in &contour.points {
        l = l.min(p.x);
        t = t.min(p.y);
        r = r.max(p.x);
        b = b.max(p.y);
    }
    Some(PixelRect::new(l, t, r + 1, b + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn page_with(rects: &[PixelRect], w: u32, h: u32) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]));
        for r in rects {
            for y in r.top..r.bottom {
                for x in r.left..r.right {
                    img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
                }
            }
        }
        img
    }

    #[test]
    fn test_grayscale_composites_alpha() {
        let backend = ImageprocBackend::new();
        let img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        let gray = backend.grayscale(&img);
        assert_eq!(gray.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_binarize_marks_dark_pixels() {
        let backend = ImageprocBackend::new();
        let img = page_with(&[PixelRect::new(2, 2, 5, 5)], 10, 10);
        let ink = backend.binarize(&backend.grayscale(&img), None);
        assert_eq!(ink.count(ink.bounds()), 9);
        assert!(ink.is_ink(2, 2));
        assert!(!ink.is_ink(0, 0));
    }

    #[test]
    fn test_binarize_blank_page() {
        let backend = ImageprocBackend::new();
        let img = page_with(&[], 10, 10);
        let ink = backend.binarize(&backend.grayscale(&img), None);
        assert_eq!(ink.count(ink.bounds()), 0);
    }

    #[test]
    fn test_outer_contours_with_child() {
        let backend = ImageprocBackend::new();
        let mut ink = InkMap::new(40, 40);
        // Hollow frame
        ink.fill(PixelRect::new(5, 5, 30, 30), true);
        ink.mask(PixelRect::new(8, 8, 27, 27));
        // Solid blob
        ink.fill(PixelRect::new(33, 33, 38, 38), true);

        let mut boxes = backend.outer_contours(&ink);
        boxes.sort_by_key(|b| b.rect.left);
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].rect, PixelRect::new(5, 5, 30, 30));
        assert!(boxes[0].has_child);
        assert_eq!(boxes[1].rect, PixelRect::new(33, 33, 38, 38));
        assert!(!boxes[1].has_child);
    }
}
