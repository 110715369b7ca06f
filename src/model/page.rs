//! Page-level input types supplied by a page source.

use super::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Page dimensions in page units and the scale used to render it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Page width in units (1 unit = 1/72 inch)
    pub width: f32,

    /// Page height in units
    pub height: f32,

    /// Pixels per unit when rendering
    #[serde(default = "default_scale")]
    pub scale: f32,
}

fn default_scale() -> f32 {
    1.0
}

impl Viewport {
    /// Create a viewport at scale 1.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            scale: 1.0,
        }
    }

    /// Same page at a different render scale.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Full page rectangle in page units.
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Rendered bitmap size in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width * self.scale).ceil().max(1.0) as u32,
            (self.height * self.scale).ceil().max(1.0) as u32,
        )
    }
}

/// One page as delivered by the page source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcePage {
    /// Zero-based page index
    pub index: usize,

    /// Page dimensions
    pub viewport: Viewport,

    /// Positioned text runs in content-stream order
    #[serde(default)]
    pub runs: Vec<TextRun>,

    /// Vector drawing operator stream
    #[serde(default)]
    pub operators: Vec<DrawOp>,

    /// Chart and figure label anchors (top-down page units)
    #[serde(default)]
    pub figure_anchors: Vec<Point>,
}

impl SourcePage {
    /// Create an empty page.
    pub fn new(index: usize, viewport: Viewport) -> Self {
        Self {
            index,
            viewport,
            runs: Vec::new(),
            operators: Vec::new(),
            figure_anchors: Vec::new(),
        }
    }

    /// Add a text run.
    pub fn with_run(mut self, run: TextRun) -> Self {
        self.runs.push(run);
        self
    }
}

/// A positioned text run.
///
/// `transform` is the PDF text matrix `[a, b, c, d, e, f]` in bottom-up
/// user space; `e`/`f` locate the baseline origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub transform: [f32; 6],
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub font: String,
}

impl TextRun {
    /// Create a run whose baseline origin sits at `(x, y)` bottom-up.
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            text: text.into(),
            transform: [height, 0.0, 0.0, height, x, y],
            width,
            height,
            font: String::new(),
        }
    }

    /// Set the font identifier.
    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = font.into();
        self
    }

    /// Font size implied by the transform's vertical scale.
    pub fn font_size(&self) -> f32 {
        let [_, _, c, d, _, _] = self.transform;
        let size = (c * c + d * d).sqrt();
        if size > 0.0 {
            size
        } else {
            self.height
        }
    }

    /// Geometry in top-down page coordinates for a page of `page_height`.
    pub fn rect(&self, page_height: f32) -> Rect {
        let height = if self.height > 0.0 {
            self.height
        } else {
            self.font_size()
        };
        let left = self.transform[4];
        let bottom = page_height - self.transform[5];
        Rect::new(left, bottom - height, left + self.width.max(0.0), bottom)
    }
}

/// Path construction opcode inside a `ConstructPath` operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PathOp {
    MoveTo,
    LineTo,
    CurveTo,
    Rectangle,
    ClosePath,
}

/// One operator of the vector drawing stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawOp {
    SetStrokeColor {
        #[serde(default)]
        color: Vec<f32>,
    },
    Transform {
        matrix: [f32; 6],
    },
    ConstructPath {
        ops: Vec<PathOp>,
        coords: Vec<f32>,
    },
    Stroke,
    Fill,
    PaintImage {
        #[serde(default)]
        name: String,
    },
    Save,
    Restore,
    Other {
        #[serde(default)]
        name: String,
    },
}
