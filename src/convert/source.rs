//! Page sources: where pages and their bitmaps come from.

use crate::error::{Error, Result};
use crate::model::{SourcePage, Viewport};
use image::imageops::FilterType;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Supplies page content and renders page bitmaps.
///
/// Implement this trait to feed pages decoded by any document library.
pub trait PageSource: Send + Sync {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Load text runs, drawing operators and geometry of one page.
    fn load_page(&self, index: usize) -> Result<SourcePage>;

    /// Render one page to an RGBA bitmap of `viewport.pixel_size()`.
    fn render(&self, index: usize, viewport: &Viewport) -> Result<RgbaImage>;
}

/// Resize `bitmap` to the viewport's pixel size if it differs.
fn fit_to_viewport(bitmap: RgbaImage, viewport: &Viewport) -> RgbaImage {
    let (width, height) = viewport.pixel_size();
    if bitmap.dimensions() == (width, height) {
        bitmap
    } else {
        log::trace!(
            "Resizing bitmap {:?} to {}x{}",
            bitmap.dimensions(),
            width,
            height
        );
        image::imageops::resize(&bitmap, width, height, FilterType::Triangle)
    }
}

/// One manifest entry: the page and its pre-rendered bitmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestPage {
    #[serde(flatten)]
    pub page: SourcePage,

    /// PNG path, relative to the manifest
    #[serde(default)]
    pub image: Option<PathBuf>,
}

/// A page dump: pages with runs, operators and bitmap paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageManifest {
    pub pages: Vec<ManifestPage>,
}

/// Pages read from a JSON manifest with one PNG per page.
#[derive(Debug, Clone)]
pub struct JsonPageSource {
    manifest: PageManifest,
    base_dir: PathBuf,
}

impl JsonPageSource {
    /// Open a manifest file. Bitmap paths resolve against its directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let manifest: PageManifest = serde_json::from_str(&data)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        log::debug!("Loaded manifest {} with {} pages", path.display(), manifest.pages.len());
        Ok(Self::from_manifest(manifest, base_dir))
    }

    pub fn from_manifest(manifest: PageManifest, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            manifest,
            base_dir: base_dir.into(),
        }
    }

    pub fn manifest(&self) -> &PageManifest {
        &self.manifest
    }

    fn entry(&self, index: usize) -> Result<&ManifestPage> {
        self.manifest
            .pages
            .get(index)
            .ok_or(Error::PageOutOfRange(index, self.manifest.pages.len()))
    }
}

impl PageSource for JsonPageSource {
    fn page_count(&self) -> usize {
        self.manifest.pages.len()
    }

    fn load_page(&self, index: usize) -> Result<SourcePage> {
        let mut page = self.entry(index)?.page.clone();
        page.index = index;
        Ok(page)
    }

    fn render(&self, index: usize, viewport: &Viewport) -> Result<RgbaImage> {
        let entry = self.entry(index)?;
        let relative = entry.image.as_ref().ok_or_else(|| Error::Render {
            page: index,
            message: "manifest has no image for this page".to_string(),
        })?;
        let path = self.base_dir.join(relative);
        let bitmap = image::open(&path)
            .map_err(|e| Error::Render {
                page: index,
                message: format!("{}: {}", path.display(), e),
            })?
            .to_rgba8();
        Ok(fit_to_viewport(bitmap, viewport))
    }
}

/// Pages and bitmaps held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryPageSource {
    pages: Vec<(SourcePage, Option<RgbaImage>)>,
}

impl MemoryPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page. Its index is set to its position.
    pub fn push(&mut self, mut page: SourcePage, bitmap: Option<RgbaImage>) {
        page.index = self.pages.len();
        self.pages.push((page, bitmap));
    }

    /// Builder form of [`push`](Self::push).
    pub fn with_page(mut self, page: SourcePage, bitmap: RgbaImage) -> Self {
        self.push(page, Some(bitmap));
        self
    }
}

impl PageSource for MemoryPageSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn load_page(&self, index: usize) -> Result<SourcePage> {
        self.pages
            .get(index)
            .map(|(page, _)| page.clone())
            .ok_or(Error::PageOutOfRange(index, self.pages.len()))
    }

    fn render(&self, index: usize, viewport: &Viewport) -> Result<RgbaImage> {
        let (_, bitmap) = self
            .pages
            .get(index)
            .ok_or(Error::PageOutOfRange(index, self.pages.len()))?;
        let bitmap = bitmap.clone().ok_or_else(|| Error::Render {
            page: index,
            message: "no bitmap".to_string(),
        })?;
        Ok(fit_to_viewport(bitmap, viewport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextRun;
    use image::Rgba;

    #[test]
    fn test_memory_source_renders_at_scale() {
        let page = SourcePage::new(0, Viewport::new(100.0, 50.0));
        let bitmap = RgbaImage::from_pixel(100, 50, Rgba([255, 255, 255, 255]));
        let source = MemoryPageSource::new().with_page(page, bitmap);

        assert_eq!(source.page_count(), 1);
        let viewport = Viewport::new(100.0, 50.0).with_scale(2.0);
        assert_eq!(source.render(0, &viewport).unwrap().dimensions(), (200, 100));
        assert!(matches!(source.load_page(1), Err(Error::PageOutOfRange(1, 1))));
    }

    #[test]
    fn test_memory_source_without_bitmap() {
        let mut source = MemoryPageSource::new();
        source.push(SourcePage::new(7, Viewport::new(10.0, 10.0)), None);
        assert_eq!(source.load_page(0).unwrap().index, 0);
        let err = source.render(0, &Viewport::new(10.0, 10.0)).unwrap_err();
        assert_eq!(err.page(), Some(0));
    }

    #[test]
    fn test_json_source_reads_manifest_and_png() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(60, 80, Rgba([255, 255, 255, 255]))
            .save(dir.path().join("p1.png"))
            .unwrap();

        let manifest = r#"{
            "pages": [
                {
                    "index": 0,
                    "viewport": {"width": 60, "height": 80},
                    "runs": [
                        {"text": "Hello", "transform": [10, 0, 0, 10, 5, 60], "width": 25, "height": 10}
                    ],
                    "image": "p1.png"
                },
                {"index": 1, "viewport": {"width": 60, "height": 80}}
            ]
        }"#;
        let path = dir.path().join("pages.json");
        std::fs::write(&path, manifest).unwrap();

        let source = JsonPageSource::open(&path).unwrap();
        assert_eq!(source.page_count(), 2);
        let page = source.load_page(0).unwrap();
        assert_eq!(page.runs, vec![TextRun::new("Hello", 5.0, 60.0, 25.0, 10.0)]);
        assert_eq!(source.render(0, &page.viewport).unwrap().dimensions(), (60, 80));
        assert!(matches!(source.render(1, &page.viewport), Err(Error::Render { page: 1, .. })));
    }
}
