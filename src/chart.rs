//! Chart geometry: pie-slice arcs and bar fills from aggregated segments.
//!
//! Pure math with no rendering; the SVG exporter and the terminal board
//! both consume this output. Angles are in degrees with 0° pointing up and
//! sweeps running clockwise, which maps onto standard trigonometry as the
//! angle−90° projection.

use crate::aggregate::{Segment, percentage};

/// Fixed circle every slice projects onto.
pub const PIE_CX: f64 = 100.0;
pub const PIE_CY: f64 = 100.0;
pub const PIE_R: f64 = 90.0;

/// Sweep at which a slice is the whole pie and must be drawn as two arcs.
/// A single arc whose start equals its end is numerically degenerate and
/// renders as nothing.
const FULL_CIRCLE_SWEEP: f64 = 359.9;

/// A laid-out pie slice with its SVG path data.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub key: String,
    pub start_angle: f64,
    pub sweep_angle: f64,
    pub path_data: String,
}

/// A laid-out column.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub key: String,
    pub height_percent: f64,
}

/// Project an angle onto the pie circle (0° up, clockwise).
fn point_at(angle: f64) -> (f64, f64) {
    let radians = (angle - 90.0).to_radians();
    (
        PIE_CX + PIE_R * radians.cos(),
        PIE_CY + PIE_R * radians.sin(),
    )
}

/// Lay out pie slices in input order, accumulating angles from 0°. Each
/// sweep is `percentage/100 × 360`. Zero-sweep segments produce no slice.
pub fn layout_pie(segments: &[Segment]) -> Vec<PieSlice> {
    let mut slices = Vec::with_capacity(segments.len());
    let mut cursor = 0.0;
    for segment in segments {
        let sweep = segment.percentage / 100.0 * 360.0;
        if sweep <= 0.0 {
            continue;
        }
        let path_data = if sweep >= FULL_CIRCLE_SWEEP {
            full_circle_path(cursor)
        } else {
            slice_path(cursor, sweep)
        };
        slices.push(PieSlice {
            key: segment.key.clone(),
            start_angle: cursor,
            sweep_angle: sweep,
            path_data,
        });
        cursor += sweep;
    }
    slices
}

/// Wedge path: move to center, line to the start boundary, arc clockwise
/// to the end boundary, close.
fn slice_path(start: f64, sweep: f64) -> String {
    let (x1, y1) = point_at(start);
    let (x2, y2) = point_at(start + sweep);
    let large_arc = if sweep > 180.0 { 1 } else { 0 };
    format!(
        "M {PIE_CX:.3} {PIE_CY:.3} L {x1:.3} {y1:.3} A {PIE_R:.3} {PIE_R:.3} 0 {large_arc} 1 {x2:.3} {y2:.3} Z"
    )
}

/// Full pie: two half-circle arcs through the point opposite the start.
fn full_circle_path(start: f64) -> String {
    let (x0, y0) = point_at(start);
    let (xh, yh) = point_at(start + 180.0);
    format!(
        "M {x0:.3} {y0:.3} A {PIE_R:.3} {PIE_R:.3} 0 1 1 {xh:.3} {yh:.3} A {PIE_R:.3} {PIE_R:.3} 0 1 1 {x0:.3} {y0:.3} Z"
    )
}

/// Lay out column heights as linear percentage-of-total, in input order.
/// Heights are 0 when the total is 0.
pub fn layout_bars(segments: &[Segment]) -> Vec<Bar> {
    let total: usize = segments.iter().map(|s| s.count).sum();
    segments
        .iter()
        .map(|segment| Bar {
            key: segment.key.clone(),
            height_percent: percentage(segment.count, total),
        })
        .collect()
}
