//! Synthetic two-column pages shared by the integration tests.
//!
//! Pages are 400 x 600 units rendered at scale 1, so page units and
//! bitmap pixels coincide. The ink follows the same layout on every page:
//!
//! - a band at rows 10..18 (title on the first page, running header after)
//! - two text columns at x 40..190 and 210..360, 20 lines from row 60
//! - a footnote region from row 320
//!
//! The table page replaces the columns with a ruled table at x 50..350.

#![allow(dead_code)]

use image::{Rgba, RgbaImage};
use relayout::{MemoryPageSource, SourcePage, TextRun, Viewport};

pub const WIDTH: f32 = 400.0;
pub const HEIGHT: f32 = 600.0;

pub fn draw(img: &mut RgbaImage, l: u32, t: u32, r: u32, b: u32) {
    for y in t..b {
        for x in l..r {
            img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
        }
    }
}

fn text_column(img: &mut RgbaImage, left: u32) {
    for k in 0..20 {
        let y = 60 + 11 * k;
        draw(img, left, y, left + 40, y + 8);
        draw(img, left + 44, y, left + 90, y + 8);
        draw(img, left + 94, y, left + 150, y + 8);
    }
}

/// Bitmap of the two-column layout.
pub fn two_column_bitmap() -> RgbaImage {
    let mut img = RgbaImage::from_pixel(400, 600, Rgba([255, 255, 255, 255]));
    draw(&mut img, 40, 10, 360, 18);
    text_column(&mut img, 40);
    text_column(&mut img, 210);
    draw(&mut img, 40, 320, 360, 328);
    draw(&mut img, 40, 331, 300, 339);
    img
}

/// A run whose box spans rows `top..top + height`, in top-down units.
pub fn run(text: &str, left: f32, top: f32, width: f32, height: f32) -> TextRun {
    TextRun::new(text, left, HEIGHT - (top + height), width, height).with_font("Times-Roman")
}

/// Title page: heading, one footnote reference, one footnote.
pub fn title_page() -> SourcePage {
    let mut page = SourcePage::new(0, Viewport::new(WIDTH, HEIGHT));
    page.runs = vec![
        run("THE STATE OF TRADE", 40.0, 10.0, 320.0, 8.0),
        run("Exports rose sharply.", 40.0, 60.0, 100.0, 8.0),
        run("1", 141.0, 58.0, 4.0, 6.0),
        run("Imports fell.", 210.0, 60.0, 70.0, 8.0),
        run("1 First note.", 40.0, 320.0, 80.0, 8.0),
    ];
    page
}

/// Body page: running header with numeral 17, a hyphenated word across
/// two lines, one footnote continued on a second footer line.
pub fn body_page() -> SourcePage {
    let mut page = SourcePage::new(1, Viewport::new(WIDTH, HEIGHT));
    page.runs = vec![
        run("Annual Review", 40.0, 10.0, 100.0, 8.0),
        run("17", 340.0, 10.0, 20.0, 8.0),
        run("Trade grew in typi-", 40.0, 60.0, 150.0, 8.0),
        run("cal fashion across the region.", 40.0, 71.0, 140.0, 8.0),
        run("1", 181.0, 69.0, 4.0, 6.0),
        run("Prices were stable.", 210.0, 60.0, 100.0, 8.0),
        run("1 See also page 12.", 40.0, 320.0, 300.0, 8.0),
        run("Source: survey.", 40.0, 331.0, 80.0, 8.0),
    ];
    page
}

/// Two pages: the title page followed by a body page.
pub fn two_page_source() -> MemoryPageSource {
    MemoryPageSource::new()
        .with_page(title_page(), two_column_bitmap())
        .with_page(body_page(), two_column_bitmap())
}

/// Bitmap of a running header, a ruled two-column table and a footer.
///
/// The table caption and notes are shorter than the rulings and flush
/// with the table's left edge.
pub fn table_bitmap() -> RgbaImage {
    let mut img = RgbaImage::from_pixel(400, 600, Rgba([255, 255, 255, 255]));
    draw(&mut img, 40, 10, 360, 18);
    // Caption
    draw(&mut img, 50, 100, 160, 108);
    draw(&mut img, 50, 112, 350, 114);
    draw(&mut img, 60, 118, 150, 126);
    draw(&mut img, 230, 118, 330, 126);
    draw(&mut img, 50, 130, 350, 132);
    draw(&mut img, 60, 136, 150, 144);
    draw(&mut img, 230, 136, 330, 144);
    draw(&mut img, 50, 148, 350, 150);
    // Notes
    draw(&mut img, 50, 154, 200, 162);
    draw(&mut img, 40, 320, 360, 328);
    img
}

/// Text of [`table_bitmap`].
pub fn table_page() -> SourcePage {
    let mut page = SourcePage::new(1, Viewport::new(WIDTH, HEIGHT));
    page.runs = vec![
        run("Annual Review", 40.0, 10.0, 100.0, 8.0),
        run("Table 1 Trade", 50.0, 100.0, 110.0, 8.0),
        run("Country", 60.0, 118.0, 90.0, 8.0),
        run("GDP", 230.0, 118.0, 100.0, 8.0),
        run("France", 60.0, 136.0, 90.0, 8.0),
        run("2.1", 230.0, 136.0, 100.0, 8.0),
        run("Source: survey.", 50.0, 154.0, 150.0, 8.0),
        run("1 A note.", 40.0, 320.0, 320.0, 8.0),
    ];
    page
}

/// Two pages: the title page followed by the table page.
pub fn table_source() -> MemoryPageSource {
    MemoryPageSource::new()
        .with_page(title_page(), two_column_bitmap())
        .with_page(table_page(), table_bitmap())
}
