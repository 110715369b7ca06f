//! Image analysis primitives used by the segmenter.
//!
//! The segmenter only composes a handful of black-box operations:
//! grayscale conversion, binarization, rectangular open/close and outer
//! contour extraction. They are expressed by the [`ImageAnalysis`] trait;
//! [`ImageprocBackend`] is the default implementation.

mod backend;
mod morphology;

pub use backend::ImageprocBackend;
pub use morphology::{close, dilate, erode, open};

use crate::model::PixelRect;
use image::{GrayImage, Luma, RgbaImage};

/// Pixel value marking ink in an [`InkMap`].
pub const INK: u8 = 255;

/// A binarized page bitmap where ink pixels are foreground.
#[derive(Debug, Clone, PartialEq)]
pub struct InkMap {
    image: GrayImage,
}

impl InkMap {
    /// Create a blank map.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    /// Wrap a grayscale image; every non-zero pixel counts as ink.
    pub fn from_gray(image: GrayImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Full-bitmap rectangle.
    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width(), self.height())
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    #[inline]
    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y)[0] != 0
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, ink: bool) {
        self.image
            .put_pixel(x, y, Luma([if ink { INK } else { 0 }]));
    }

    /// Paint every pixel of `rect` (clipped to the map).
    pub fn fill(&mut self, rect: PixelRect, ink: bool) {
        let rect = self.clip(rect);
        for y in rect.top..rect.bottom {
            for x in rect.left..rect.right {
                self.set(x, y, ink);
            }
        }
    }

    /// Clear ink inside `rect`.
    pub fn mask(&mut self, rect: PixelRect) {
        self.fill(rect, false);
    }

    /// Clear all ink outside `rect`.
    pub fn clear_outside(&mut self, rect: PixelRect) {
        let rect = self.clip(rect);
        let (w, h) = (self.width(), self.height());
        for y in 0..h {
            for x in 0..w {
                if !rect.contains_point(x, y) {
                    self.set(x, y, false);
                }
            }
        }
    }

    /// Copy of the pixels inside `rect` as a new map.
    pub fn crop(&self, rect: PixelRect) -> InkMap {
        let rect = self.clip(rect);
        let sub = image::imageops::crop_imm(
            &self.image,
            rect.left,
            rect.top,
            rect.width(),
            rect.height(),
        )
        .to_image();
        InkMap::from_gray(sub)
    }

    /// Clip a rectangle to the map.
    pub fn clip(&self, rect: PixelRect) -> PixelRect {
        PixelRect::new(
            rect.left.min(self.width()),
            rect.top.min(self.height()),
            rect.right.min(self.width()),
            rect.bottom.min(self.height()),
        )
    }

    /// Ink pixels inside `rect`.
    pub fn count(&self, rect: PixelRect) -> u64 {
        let rect = self.clip(rect);
        let mut n = 0u64;
        for y in rect.top..rect.bottom {
            for x in rect.left..rect.right {
                if self.is_ink(x, y) {
                    n += 1;
                }
            }
        }
        n
    }

    /// Fraction of `rect` covered by ink.
    pub fn density(&self, rect: PixelRect) -> f32 {
        let rect = self.clip(rect);
        if rect.is_empty() {
            return 0.0;
        }
        self.count(rect) as f32 / rect.area() as f32
    }

    /// Ink count of each row of `rect`, top to bottom.
    pub fn row_counts(&self, rect: PixelRect) -> Vec<u32> {
        let rect = self.clip(rect);
        (rect.top..rect.bottom)
            .map(|y| {
                (rect.left..rect.right)
                    .filter(|&x| self.is_ink(x, y))
                    .count() as u32
            })
            .collect()
    }

    /// Ink count of each column of `rect`, left to right.
    pub fn column_counts(&self, rect: PixelRect) -> Vec<u32> {
        let rect = self.clip(rect);
        let mut counts = vec![0u32; rect.width() as usize];
        for y in rect.top..rect.bottom {
            for x in rect.left..rect.right {
                if self.is_ink(x, y) {
                    counts[(x - rect.left) as usize] += 1;
                }
            }
        }
        counts
    }

    /// Tight bounding box of the ink inside `rect`.
    pub fn ink_bounds(&self, rect: PixelRect) -> Option<PixelRect> {
        let rect = self.clip(rect);
        let mut found: Option<PixelRect> = None;
        for y in rect.top..rect.bottom {
            for x in rect.left..rect.right {
                if self.is_ink(x, y) {
                    let px = PixelRect::new(x, y, x + 1, y + 1);
                    found = Some(found.map_or(px, |f| f.union(&px)));
                }
            }
        }
        found
    }
}

/// Bounding box of one outer contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContourBox {
    pub rect: PixelRect,
    /// The contour encloses at least one hole
    pub has_child: bool,
}

/// Low-level image primitives the segmenter composes.
///
/// Implementations must be deterministic. They run on the segmentation
/// worker thread and are never called concurrently.
pub trait ImageAnalysis: Send {
    /// Convert a rendered page to grayscale (alpha composited over white).
    fn grayscale(&self, image: &RgbaImage) -> GrayImage;

    /// Binarize a grayscale page; dark pixels become ink.
    fn binarize(&self, gray: &GrayImage, threshold: Option<u8>) -> InkMap;

    /// Morphological opening with a `width` x `height` rectangle.
    fn open(&self, ink: &InkMap, width: u32, height: u32) -> InkMap;

    /// Morphological closing with a `width` x `height` rectangle.
    fn close(&self, ink: &InkMap, width: u32, height: u32) -> InkMap;

    /// Bounding boxes of the outermost contours.
    fn outer_contours(&self, ink: &InkMap) -> Vec<ContourBox>;
}
