//! Binary morphology with rectangular structuring elements.
//!
//! A `w` x `h` rectangle is separable, so each operation runs as a
//! horizontal line mask followed by a vertical one through
//! `imageproc::morphology`. Lines longer than an `imageproc` mask allows
//! are applied as a chain of shorter lines.
//!
//! Pixels beyond the bitmap edge are background: opening and closing work
//! on a copy padded with blank pixels on every side, so ink touching the
//! edge is eroded like any other ink.

use super::InkMap;
use image::{imageops, GrayImage};
use imageproc::morphology::{grayscale_dilate, grayscale_erode, Mask};

/// Longest line an `imageproc` mask can hold.
const MAX_LINE: u32 = 511;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Op {
    Erode,
    Dilate,
}

/// Line mask of `len` pixels with `before` of them ahead of the origin.
fn line_mask(len: u32, before: u32, horizontal: bool) -> Mask {
    let (w, h) = if horizontal { (len, 1) } else { (1, len) };
    let line = GrayImage::from_pixel(w, h, image::Luma([255]));
    let centre = before as u8;
    if horizontal {
        Mask::from_image(&line, centre, 0)
    } else {
        Mask::from_image(&line, 0, centre)
    }
}

/// Apply a 1-D window of `size` along rows (`horizontal`) or columns.
fn pass(src: GrayImage, size: u32, horizontal: bool, op: Op) -> GrayImage {
    if size <= 1 {
        return src;
    }
    // Dilation uses the reflected window.
    let mut before = match op {
        Op::Erode => size / 2,
        Op::Dilate => size - 1 - size / 2,
    };
    let mut remaining = size;
    let mut image = src;
    while remaining > 0 {
        let (len, centre) = if remaining > MAX_LINE {
            (MAX_LINE, MAX_LINE / 2)
        } else {
            (remaining, before)
        };
        let mask = line_mask(len, centre, horizontal);
        image = match op {
            Op::Erode => grayscale_erode(&image, &mask),
            Op::Dilate => grayscale_dilate(&image, &mask),
        };
        if remaining > MAX_LINE {
            remaining -= MAX_LINE - 1;
            before -= centre;
        } else {
            remaining = 0;
        }
    }
    image
}

fn apply(image: GrayImage, width: u32, height: u32, op: Op) -> GrayImage {
    let horizontal = pass(image, width, true, op);
    pass(horizontal, height, false, op)
}

/// Copy of `ink` with `dx` blank columns and `dy` blank rows on each side.
fn padded(ink: &InkMap, dx: u32, dy: u32) -> GrayImage {
    let mut canvas = GrayImage::new(ink.width() + 2 * dx, ink.height() + 2 * dy);
    imageops::replace(&mut canvas, ink.as_image(), dx as i64, dy as i64);
    canvas
}

fn unpadded(image: &GrayImage, ink: &InkMap, dx: u32, dy: u32) -> InkMap {
    InkMap::from_gray(imageops::crop_imm(image, dx, dy, ink.width(), ink.height()).to_image())
}

/// Run `ops` on `ink` padded by the rectangle size.
fn chain(ink: &InkMap, width: u32, height: u32, ops: [Op; 2]) -> InkMap {
    if ink.width() == 0 || ink.height() == 0 {
        return ink.clone();
    }
    let (dx, dy) = (width.max(1), height.max(1));
    let mut image = padded(ink, dx, dy);
    for op in ops {
        image = apply(image, width, height, op);
    }
    unpadded(&image, ink, dx, dy)
}

/// Erode with a `width` x `height` rectangle. Ink within half the
/// rectangle of the edge is removed.
pub fn erode(ink: &InkMap, width: u32, height: u32) -> InkMap {
    let (dx, dy) = (width.max(1), height.max(1));
    let image = apply(padded(ink, dx, dy), width, height, Op::Erode);
    unpadded(&image, ink, dx, dy)
}

/// Dilate with a `width` x `height` rectangle.
pub fn dilate(ink: &InkMap, width: u32, height: u32) -> InkMap {
    InkMap::from_gray(apply(ink.as_image().clone(), width, height, Op::Dilate))
}

/// Opening: removes ink that cannot contain the rectangle.
pub fn open(ink: &InkMap, width: u32, height: u32) -> InkMap {
    chain(ink, width, height, [Op::Erode, Op::Dilate])
}

/// Closing: bridges gaps narrower than the rectangle.
pub fn close(ink: &InkMap, width: u32, height: u32) -> InkMap {
    chain(ink, width, height, [Op::Dilate, Op::Erode])
}
