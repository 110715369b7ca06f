//! Crop range detection from crop marks in the vector drawing stream.
//!
//! Print-ready pages carry eight short tick strokes outside the trim box,
//! drawn right after a stroke colour change. Vertical ticks give the x
//! bounds and horizontal ticks the y bounds of the printable area.

use crate::model::{DrawOp, PathOp, Rect, Viewport};
use crate::options::CropParams;

/// Number of ticks in a full crop mark set.
const TICK_COUNT: usize = 8;

/// Finds the printable page rectangle.
#[derive(Debug, Clone, Default)]
pub struct CropRangeDetector {
    params: CropParams,
}

/// Orientation of one crop tick.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Tick {
    /// Vertical stroke at this x (bottom-up page units)
    Vertical(f32),
    /// Horizontal stroke at this y (bottom-up page units)
    Horizontal(f32),
}

impl CropRangeDetector {
    pub fn new(params: CropParams) -> Self {
        Self { params }
    }

    /// Detect the crop rectangle in top-down page units. Never fails: a
    /// centred reference rectangle is returned when no marks are found.
    pub fn detect(&self, operators: &[DrawOp], viewport: &Viewport) -> Rect {
        let starts: Vec<usize> = operators
            .iter()
            .enumerate()
            .filter(|(_, op)| matches!(op, DrawOp::SetStrokeColor { .. }))
            .map(|(i, _)| i)
            .collect();

        let strategies: [(&str, fn(&Self, &[DrawOp], usize) -> Option<Vec<Tick>>); 3] = [
            ("transformed ticks", Self::match_transformed_ticks),
            ("single path", Self::match_single_path),
            ("stroked pairs", Self::match_stroked_pairs),
        ];

        for (name, strategy) in strategies {
            for &i in &starts {
                if let Some(ticks) = strategy(self, operators, i) {
                    if let Some(rect) = self.bounds_from_ticks(&ticks, viewport) {
                        log::debug!("Crop range from {} at operator {}: {:?}", name, i, rect);
                        return rect;
                    }
                }
            }
        }

        let rect = self.reference_rect(viewport);
        log::debug!("No crop marks found, using reference area {:?}", rect);
        rect
    }

    /// Primary pattern: eight `Transform, ConstructPath, Stroke` triples
    /// starting right after the colour change.
    fn match_transformed_ticks(&self, ops: &[DrawOp], start: usize) -> Option<Vec<Tick>> {
        let mut ticks = Vec::with_capacity(TICK_COUNT);
        for k in 0..TICK_COUNT {
            let base = start + 1 + 3 * k;
            let (e, f) = match ops.get(base)? {
                DrawOp::Transform { matrix } => (matrix[4], matrix[5]),
                _ => return None,
            };
            let tick = match ops.get(base + 1)? {
                DrawOp::ConstructPath { ops, coords } => self.tick(ops, coords, e, f)?,
                _ => return None,
            };
            if ops.get(base + 2)? != &DrawOp::Stroke {
                return None;
            }
            ticks.push(tick);
        }
        Some(ticks)
    }

    /// Fallback: one path holding four move+line pairs.
    fn match_single_path(&self, ops: &[DrawOp], start: usize) -> Option<Vec<Tick>> {
        let DrawOp::ConstructPath { ops, coords } = ops.get(start + 1)? else {
            return None;
        };
        if ops.len() != 8 || coords.len() != 16 {
            return None;
        }
        (0..4)
            .map(|k| self.tick(&ops[2 * k..2 * k + 2], &coords[4 * k..4 * k + 4], 0.0, 0.0))
            .collect()
    }

    /// Fallback: four independent `ConstructPath, Stroke` pairs.
    fn match_stroked_pairs(&self, ops: &[DrawOp], start: usize) -> Option<Vec<Tick>> {
        (0..4)
            .map(|k| {
                let base = start + 1 + 2 * k;
                let tick = match ops.get(base)? {
                    DrawOp::ConstructPath { ops, coords } => self.tick(ops, coords, 0.0, 0.0)?,
                    _ => return None,
                };
                (ops.get(base + 1)? == &DrawOp::Stroke).then_some(tick)
            })
            .collect()
    }

    /// Recognize a `MoveTo, LineTo` path with exactly one zero delta.
    fn tick(&self, ops: &[PathOp], coords: &[f32], e: f32, f: f32) -> Option<Tick> {
        if ops != [PathOp::MoveTo, PathOp::LineTo] || coords.len() != 4 {
            return None;
        }
        let dx = coords[2] - coords[0];
        let dy = coords[3] - coords[1];
        let eps = self.params.tick_epsilon;
        match (dx.abs() < eps, dy.abs() < eps) {
            (true, false) => Some(Tick::Vertical(e + coords[0])),
            (false, true) => Some(Tick::Horizontal(f + coords[1])),
            _ => None,
        }
    }

    fn bounds_from_ticks(&self, ticks: &[Tick], viewport: &Viewport) -> Option<Rect> {
        let (mut xs, mut ys) = (Vec::new(), Vec::new());
        for tick in ticks {
            match *tick {
                Tick::Vertical(x) => xs.push(x),
                Tick::Horizontal(y) => ys.push(y),
            }
        }
        let (min_x, max_x) = min_max(&xs)?;
        let (min_y, max_y) = min_max(&ys)?;
        if max_x - min_x <= 2.0 * self.params.inset || max_y - min_y <= 2.0 * self.params.inset {
            return None;
        }

        // Bottom-up to top-down
        let rect = Rect::new(
            min_x,
            viewport.height - max_y,
            max_x,
            viewport.height - min_y,
        );
        Some(rect.inset(self.params.inset))
    }

    fn reference_rect(&self, viewport: &Viewport) -> Rect {
        let w = self.params.reference_width.min(viewport.width);
        let h = self.params.reference_height.min(viewport.height);
        let left = ((viewport.width - w) / 2.0).max(0.0);
        let top = ((viewport.height - h) / 2.0).max(0.0);
        Rect::from_size(left, top, w, h)
    }
}

fn min_max(values: &[f32]) -> Option<(f32, f32)> {
    if values.len() < 2 {
        return None;
    }
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    Some((min, max))
}
