//! Layout options and tunable heuristics.
//!
//! Every geometric threshold the pipeline uses is a named field here so
//! the heuristics can be tuned per corpus. Pixel thresholds apply to the
//! rendered bitmap; unit thresholds apply to page coordinates.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options for reconstructing a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Run page-local stages in parallel
    pub parallel: bool,

    /// Footnote numbering policy
    pub footnote_numbering: FootnoteNumbering,

    /// Pixels per page unit requested from the page source
    pub render_scale: f32,

    pub crop: CropParams,
    pub segment: SegmentParams,
    pub table: TableParams,
    pub classify: ClassifyParams,
    pub assembly: AssemblyParams,
    pub footnote: FootnoteParams,
}

impl LayoutOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Parse options from a JSON string. Missing fields keep their defaults.
    pub fn from_json(data: &str) -> Result<Self> {
        let options: LayoutOptions = serde_json::from_str(data)?;
        options.validate()?;
        Ok(options)
    }

    /// Overlay the fields present in a JSON file on these options.
    ///
    /// Fields the file leaves out keep their current values, not the
    /// defaults. Unknown fields are still rejected.
    pub fn merge_json_file<P: AsRef<Path>>(&self, path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        self.merge_json(&data)
    }

    /// Overlay the fields present in a JSON string on these options.
    pub fn merge_json(&self, data: &str) -> Result<Self> {
        let mut base = serde_json::to_value(self)?;
        let overlay: serde_json::Value = serde_json::from_str(data)?;
        merge_value(&mut base, overlay);
        let options: LayoutOptions = serde_json::from_value(base)?;
        options.validate()?;
        Ok(options)
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip failing pages).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set footnote numbering policy.
    pub fn with_footnote_numbering(mut self, numbering: FootnoteNumbering) -> Self {
        self.footnote_numbering = numbering;
        self
    }

    /// Set render scale.
    pub fn with_render_scale(mut self, scale: f32) -> Self {
        self.render_scale = scale;
        self
    }

    /// Check that every value is in its accepted range.
    pub fn validate(&self) -> Result<()> {
        fn fraction(name: &str, v: f32) -> Result<()> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(Error::InvalidOptions(format!(
                    "{name} must be between 0 and 1, got {v}"
                )))
            }
        }
        fn positive(name: &str, v: f32) -> Result<()> {
            if v > 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(Error::InvalidOptions(format!(
                    "{name} must be positive, got {v}"
                )))
            }
        }

        positive("render_scale", self.render_scale)?;
        positive("crop.reference_width", self.crop.reference_width)?;
        positive("crop.reference_height", self.crop.reference_height)?;

        let s = &self.segment;
        fraction("segment.first_page_header_fraction", s.first_page_header_fraction)?;
        fraction("segment.header_fraction", s.header_fraction)?;
        fraction("segment.title_band_height_tolerance", s.title_band_height_tolerance)?;
        fraction("segment.image_density", s.image_density)?;
        fraction("segment.contained_overlap", s.contained_overlap)?;
        positive("segment.footer_gap_ratio", s.footer_gap_ratio)?;
        if s.block_close_width == 0 || s.block_close_height == 0 || s.rule_min_width == 0 {
            return Err(Error::InvalidOptions(
                "segment kernel sizes must be at least 1 pixel".to_string(),
            ));
        }

        let t = &self.table;
        fraction("table.rule_min_fraction", t.rule_min_fraction)?;
        fraction("table.column_river_density", t.column_river_density)?;
        fraction("table.row_river_density", t.row_river_density)?;
        fraction("table.content_density", t.content_density)?;
        if t.min_rulings < 3 {
            return Err(Error::InvalidOptions(format!(
                "table.min_rulings must be at least 3, got {}",
                t.min_rulings
            )));
        }

        positive("classify.line_tolerance", self.classify.line_tolerance)?;
        positive("assembly.caption_gap_ratio", self.assembly.caption_gap_ratio)?;
        Ok(())
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            parallel: true,
            footnote_numbering: FootnoteNumbering::PageLocal,
            render_scale: 1.0,
            crop: CropParams::default(),
            segment: SegmentParams::default(),
            table: TableParams::default(),
            classify: ClassifyParams::default(),
            assembly: AssemblyParams::default(),
            footnote: FootnoteParams::default(),
        }
    }
}

/// Error handling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Abort the document on the first page failure
    #[default]
    Strict,
    /// Skip failing pages and continue
    Lenient,
}

/// How footnote indices relate across pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FootnoteNumbering {
    /// Each page restarts at 1; indices are shifted by a running offset
    #[default]
    PageLocal,
    /// The document numbers footnotes continuously; printed indices are kept
    Continuous,
}

/// Crop range detection parameters (page units).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropParams {
    /// Width of the fallback print area
    pub reference_width: f32,
    /// Height of the fallback print area
    pub reference_height: f32,
    /// Inset applied to detected bounds to exclude mark ink
    pub inset: f32,
    /// Coordinates closer to zero than this count as zero in tick tests
    pub tick_epsilon: f32,
}

impl Default for CropParams {
    fn default() -> Self {
        Self {
            reference_width: 595.276,
            reference_height: 864.567,
            inset: 2.0,
            tick_epsilon: 0.01,
        }
    }
}

/// Zone segmentation parameters (bitmap pixels unless noted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SegmentParams {
    /// Fixed binarization threshold; Otsu's method when unset
    pub binarize_threshold: Option<u8>,

    /// Fraction of the page scanned for the title band on the first page
    pub first_page_header_fraction: f32,
    /// Fraction of the page scanned for the header band on later pages
    pub header_fraction: f32,
    /// Blank rows that end an ink band
    pub band_blank_rows: u32,
    /// Largest gap bridged when extending a multi-line title
    pub title_band_max_gap: u32,
    /// Allowed relative height difference between title bands
    pub title_band_height_tolerance: f32,

    /// Blank run that always qualifies as the footnote separator
    pub footer_min_gap: u32,
    /// Ratio over the largest prior blank run that qualifies a separator
    pub footer_gap_ratio: f32,

    /// Minimum framed figure width
    pub figure_min_width: u32,
    /// Minimum framed figure height
    pub figure_min_height: u32,
    /// Minimum size of a region claimed by a figure label anchor
    pub anchor_min_size: u32,

    /// Opening kernel width that isolates horizontal rules
    pub rule_min_width: u32,
    /// Thickest run of rows still treated as a rule
    pub rule_max_thickness: u32,
    /// Rules closer than this join one table core
    pub table_core_max_gap: u32,
    /// Rules needed for a table core
    pub table_min_rules: usize,
    /// Blank rows that stop table expansion
    pub table_expand_blank_rows: u32,

    /// Horizontal closing kernel width for text blocks
    pub block_close_width: u32,
    /// Vertical closing kernel height for text blocks
    pub block_close_height: u32,
    /// Blocks smaller than this area are noise
    pub min_block_area: u64,
    /// Ink density above which a block is an image
    pub image_density: f32,

    /// Tolerance around the page centre for column classification
    pub centre_tolerance: u32,
    /// Tallest centre-crossing block that can seed a heading
    pub heading_max_height: u32,
    /// Overlap fraction of the smaller block that forces a merge
    pub contained_overlap: f32,
    /// Edge tolerance for merging blocks on one horizontal line
    pub same_line_tolerance: u32,
    /// Vertical overlap needed to put blocks on one reading line
    pub line_tolerance: u32,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            binarize_threshold: None,
            first_page_header_fraction: 0.35,
            header_fraction: 0.20,
            band_blank_rows: 5,
            title_band_max_gap: 40,
            title_band_height_tolerance: 0.30,
            footer_min_gap: 60,
            footer_gap_ratio: 3.5,
            figure_min_width: 100,
            figure_min_height: 100,
            anchor_min_size: 20,
            rule_min_width: 120,
            rule_max_thickness: 6,
            table_core_max_gap: 60,
            table_min_rules: 2,
            table_expand_blank_rows: 20,
            block_close_width: 9,
            block_close_height: 9,
            min_block_area: 4,
            image_density: 0.85,
            centre_tolerance: 10,
            heading_max_height: 120,
            contained_overlap: 0.95,
            same_line_tolerance: 10,
            line_tolerance: 8,
        }
    }
}

/// Table structure parsing parameters (bitmap pixels unless noted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableParams {
    /// Ruling kernel width as a fraction of the table width
    pub rule_min_fraction: f32,
    /// Rulings needed to parse a table into cells
    pub min_rulings: usize,
    /// Ink density below which a column is a river
    pub column_river_density: f32,
    /// Narrowest column river
    pub column_river_min_width: u32,
    /// Ink density below which a row is a river
    pub row_river_density: f32,
    /// Shortest row river
    pub row_river_min_height: u32,
    /// Row dividers closer than this are merged
    pub divider_dedupe: u32,
    /// Ink coverage above which a cell has content
    pub content_density: f32,
    /// Table zones whose sides all lie within this are duplicates
    pub zone_dedupe: u32,
}

impl Default for TableParams {
    fn default() -> Self {
        Self {
            rule_min_fraction: 0.6,
            min_rulings: 3,
            column_river_density: 0.01,
            column_river_min_width: 5,
            row_river_density: 0.02,
            row_river_min_height: 3,
            divider_dedupe: 10,
            content_density: 0.005,
            zone_dedupe: 5,
        }
    }
}

/// Item classification parameters (page units).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifyParams {
    /// Vertical-centre distance that keeps runs on one line
    pub line_tolerance: f32,
    /// Run height at which a run is a heading candidate on its own
    pub heading_min_height: f32,
    /// How far a marker must sit above the previous run's baseline
    pub superscript_min_raise: f32,
}

impl Default for ClassifyParams {
    fn default() -> Self {
        Self {
            line_tolerance: 5.0,
            heading_min_height: 16.0,
            superscript_min_raise: 1.0,
        }
    }
}

/// Reading-order assembly parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssemblyParams {
    /// Indent beyond the zone margin that starts a paragraph (page units)
    pub indent_threshold: f32,
    /// Gap over the median line gap that ends a caption or paragraph
    pub caption_gap_ratio: f32,
    /// Gap over the average character width that inserts a space
    pub space_gap_ratio: f32,
    /// Title-case heading text
    pub title_case_headings: bool,
    /// Prefixes whose line-break hyphen is kept
    pub kept_prefixes: Vec<String>,
    /// Fragments that never stand alone after a hyphen
    pub bound_suffixes: Vec<String>,
    /// Words always written solid
    pub solid_compounds: Vec<String>,
}

impl Default for AssemblyParams {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            indent_threshold: 5.0,
            caption_gap_ratio: 1.5,
            space_gap_ratio: 0.2,
            title_case_headings: true,
            kept_prefixes: words(&[
                "anti", "co", "cross", "ex", "inter", "long", "low", "high", "multi", "non",
                "post", "pre", "quasi", "self", "semi", "short", "well", "full", "half",
                "mid", "large", "small",
            ]),
            bound_suffixes: words(&[
                "tion", "tions", "sion", "sions", "ment", "ments", "ness", "ing", "ed", "ly",
                "al", "ally", "ity", "ities", "ous", "ive", "ism", "ist", "ists", "able",
                "ible", "ance", "ence", "er", "ers", "est",
            ]),
            solid_compounds: words(&[
                "cooperate",
                "cooperation",
                "coordinate",
                "coordination",
                "nonetheless",
                "preexisting",
                "postwar",
                "multinational",
                "international",
                "interest",
                "selfish",
            ]),
        }
    }
}

/// Footnote parsing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FootnoteParams {
    /// Log a warning for every reference/entry mismatch
    pub warn_on_mismatch: bool,
    /// Treat a bare integer at the bottom of the footer as the folio
    pub folio_in_footer: bool,
}

impl Default for FootnoteParams {
    fn default() -> Self {
        Self {
            warn_on_mismatch: true,
            folio_in_footer: true,
        }
    }
}

/// Recursively overlay `overlay` onto `base`; non-object values replace.
fn merge_value(base: &mut serde_json::Value, overlay: serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
