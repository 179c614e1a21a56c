//! Layout engine.
//!
//! Computes percentage-of-stage geometry for every door in
//! `[start_day, end_day]`, in one of two modes:
//!
//! - **Sequential**: a gap-based grid. Size overrides keep the door centered
//!   in its original cell; explicit position overrides win outright.
//! - **Scattered**: free-form. Override fields are merged per-field; any
//!   missing field falls back to a simple left-to-right flow grid.
//!
//! The two fallback formulas are intentionally separate algorithms and are
//! tested independently.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{CalendarConfig, DoorOverride, LayoutMode, LayoutOverrides};
use crate::error::LayoutError;

/// Door position and size, in percent of the stage area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DoorGeometry {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl DoorGeometry {
    /// Whether two doors overlap, requiring at least `pad` percent of
    /// clearance between them.
    pub fn overlaps(&self, other: &DoorGeometry, pad: f64) -> bool {
        !(self.left + self.width + pad <= other.left
            || other.left + other.width + pad <= self.left
            || self.top + self.height + pad <= other.top
            || other.top + other.height + pad <= self.top)
    }
}

/// Compute geometry for every door in the configured range.
pub fn compute_layout(
    config: &CalendarConfig,
    overrides: &LayoutOverrides,
) -> BTreeMap<u32, DoorGeometry> {
    let cfg = config.normalized();
    match cfg.layout_mode {
        LayoutMode::Sequential => sequential_layout(&cfg, overrides),
        LayoutMode::Scattered => scattered_layout(&cfg, overrides),
    }
}

/// Gap-based grid: `cols` columns, rows derived from the door count.
///
/// Overridden sizes are centered within the door's original cell; overridden
/// positions are applied as-is.
fn sequential_layout(
    cfg: &CalendarConfig,
    overrides: &LayoutOverrides,
) -> BTreeMap<u32, DoorGeometry> {
    let total = cfg.total_days();
    let cols = cfg.cols;
    let rows = total.div_ceil(cols).max(1);
    let gap = cfg.grid_gap_percent;
    let cell_w = (100.0 - (f64::from(cols) + 1.0) * gap) / f64::from(cols);
    let cell_h = (100.0 - (f64::from(rows) + 1.0) * gap) / f64::from(rows);

    let mut doors = BTreeMap::new();
    for i in 0..total {
        let day = cfg.start_day + i;
        let col = f64::from(i % cols);
        let row = f64::from(i / cols);
        let cell_left = gap + col * (cell_w + gap);
        let cell_top = gap + row * (cell_h + gap);

        let ov = overrides.get(day);
        let width = ov.and_then(|o| o.width).unwrap_or(cell_w);
        let height = ov.and_then(|o| o.height).unwrap_or(cell_h);
        let left = ov
            .and_then(|o| o.left)
            .unwrap_or_else(|| cell_left + (cell_w - width) / 2.0);
        let top = ov
            .and_then(|o| o.top)
            .unwrap_or_else(|| cell_top + (cell_h - height) / 2.0);

        doors.insert(
            day,
            DoorGeometry {
                left,
                top,
                width,
                height,
            },
        );
    }
    doors
}

/// Free-form placement with per-field fallback.
///
/// Each geometry field comes from the override when present; missing fields
/// fall back to a flow grid with `ceil(sqrt(end_day))` columns, 22% row
/// pitch and a fixed 16% door height.
fn scattered_layout(
    cfg: &CalendarConfig,
    overrides: &LayoutOverrides,
) -> BTreeMap<u32, DoorGeometry> {
    let cols = (f64::from(cfg.end_day).sqrt().ceil() as u32).max(1);
    let col_width = 100.0 / f64::from(cols);

    let mut doors = BTreeMap::new();
    for day in cfg.start_day..=cfg.end_day {
        let idx = day - cfg.start_day;
        let row = f64::from(idx / cols);
        let col = f64::from(idx % cols);
        let fallback = DoorGeometry {
            left: col * col_width + 1.0,
            top: row * 22.0 + 4.0,
            width: col_width - 2.0,
            height: 16.0,
        };

        let ov = overrides.get(day);
        doors.insert(
            day,
            DoorGeometry {
                left: ov.and_then(|o| o.left).unwrap_or(fallback.left),
                top: ov.and_then(|o| o.top).unwrap_or(fallback.top),
                width: ov.and_then(|o| o.width).unwrap_or(fallback.width),
                height: ov.and_then(|o| o.height).unwrap_or(fallback.height),
            },
        );
    }
    doors
}

/// Bounds and sizing rules for [`randomize_overrides`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomizeOptions {
    pub min_width: f64,
    pub max_width: f64,
    pub min_height: f64,
    pub max_height: f64,
    /// Minimal clearance between doors, percent.
    pub padding: f64,
    /// Doors keep this distance from the stage edge, percent.
    pub edge_padding: f64,
    /// Placement attempts per door before giving up.
    pub max_attempts: u32,
}

impl Default for RandomizeOptions {
    fn default() -> Self {
        Self {
            min_width: 6.0,
            max_width: 18.0,
            min_height: 8.0,
            max_height: 18.0,
            padding: 2.0,
            edge_padding: 2.0,
            max_attempts: 10_000,
        }
    }
}

/// Generate a full scattered override set with random, non-overlapping
/// placement.
///
/// The final door gets the maximal size and door 6 the second-largest, so
/// they read as the calendar's highlights; the rest draw from a slightly
/// reduced size range. Placement is rejection-sampled against already-placed
/// doors.
///
/// # Errors
///
/// Returns [`LayoutError::PlacementFailed`] when a door cannot be placed
/// within `max_attempts` tries (stage too crowded for the requested sizes).
pub fn randomize_overrides(
    config: &CalendarConfig,
    options: &RandomizeOptions,
    rng: &mut impl Rng,
) -> Result<LayoutOverrides, LayoutError> {
    let cfg = config.normalized();
    let opts = options;

    // Highlight doors are placed first so their sizes take priority.
    let mut days: Vec<u32> = (cfg.start_day..=cfg.end_day).collect();
    days.sort_by_key(|&d| {
        if d == cfg.end_day {
            (0, d)
        } else if d == 6 {
            (1, d)
        } else {
            (2, d)
        }
    });

    let max_w_others = (opts.max_width - 2.0).max(opts.min_width);
    let max_h_others = (opts.max_height - 2.0).max(opts.min_height);

    let mut placed: Vec<DoorGeometry> = Vec::new();
    let mut overrides = LayoutOverrides::empty();
    for day in days {
        let mut placed_ok = false;
        for _ in 0..opts.max_attempts {
            let (width, height) = if day == cfg.end_day {
                (opts.max_width, opts.max_height)
            } else if day == 6 {
                (
                    (opts.max_width - 1.0).max(opts.min_width),
                    (opts.max_height - 1.0).max(opts.min_height),
                )
            } else {
                (
                    rng.gen_range(opts.min_width..=max_w_others),
                    rng.gen_range(opts.min_height..=max_h_others),
                )
            };

            let max_left = 100.0 - width - opts.edge_padding;
            let max_top = 100.0 - height - opts.edge_padding;
            if max_left < opts.edge_padding || max_top < opts.edge_padding {
                continue;
            }
            let candidate = DoorGeometry {
                left: rng.gen_range(opts.edge_padding..=max_left),
                top: rng.gen_range(opts.edge_padding..=max_top),
                width,
                height,
            };

            if placed.iter().all(|p| !candidate.overlaps(p, opts.padding)) {
                placed.push(candidate);
                overrides.insert(
                    day,
                    DoorOverride {
                        top: Some(candidate.top),
                        left: Some(candidate.left),
                        width: Some(candidate.width),
                        height: Some(candidate.height),
                    },
                );
                placed_ok = true;
                break;
            }
        }
        if !placed_ok {
            return Err(LayoutError::PlacementFailed {
                day,
                attempts: opts.max_attempts,
            });
        }
    }
    Ok(overrides)
}
