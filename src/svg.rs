//! SVG chart sheet writer.
//!
//! Renders the same aggregation the terminal board shows into a single
//! standalone SVG document: per epic, a state pie, a type pie, and an
//! open-tickets-by-team column chart. All geometry comes from the chart
//! module; this file only positions groups and writes markup.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use html_escape::encode_text;

use crate::aggregate::{self, Segment};
use crate::board_config::TrackedEpic;
use crate::chart;
use crate::resolve::{EpicResolution, MemberDirectory};
use crate::workflow::{CanonicalState, StateIndex};

const SHEET_WIDTH: f64 = 840.0;
const MARGIN: f64 = 20.0;
const HEADER_HEIGHT: f64 = 60.0;

/// Row heights by how much of the epic resolved.
const ROW_FULL: f64 = 350.0;
const ROW_DEGRADED: f64 = 60.0;
const ROW_MISSING: f64 = 50.0;

const COLUMN_CHART_W: f64 = 200.0;
const COLUMN_CHART_H: f64 = 160.0;

pub struct SvgWriter<W: Write> {
    writer: W,
}

impl<W: Write> SvgWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write the whole chart sheet. One row per tracked epic, in tracked
    /// order; degraded and missing epics get a short placeholder row.
    pub fn write_board(
        &mut self,
        tracked: &[TrackedEpic],
        resolutions: &[EpicResolution],
        index: &StateIndex,
        directory: &MemberDirectory,
        generated_at: DateTime<Utc>,
    ) -> Result<()> {
        let height =
            HEADER_HEIGHT + resolutions.iter().map(row_height).sum::<f64>() + MARGIN;
        writeln!(
            self.writer,
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{SHEET_WIDTH:.0}" height="{height:.0}" viewBox="0 0 {SHEET_WIDTH:.0} {height:.0}" font-family="sans-serif">"##
        )?;
        writeln!(self.writer, r##"<rect width="100%" height="100%" fill="#ffffff"/>"##)?;
        writeln!(
            self.writer,
            r##"<text x="{MARGIN:.0}" y="30" font-size="20" font-weight="600" fill="#111827">Epic Board</text>"##
        )?;
        writeln!(
            self.writer,
            r##"<text x="{MARGIN:.0}" y="48" font-size="11" fill="#6b7280">generated {}</text>"##,
            generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;

        let mut y = HEADER_HEIGHT;
        for (epic_cfg, resolution) in tracked.iter().zip(resolutions) {
            self.write_epic_row(y, epic_cfg, resolution, index, directory)?;
            y += row_height(resolution);
        }

        writeln!(self.writer, "</svg>")?;
        Ok(())
    }

    fn write_epic_row(
        &mut self,
        y: f64,
        epic_cfg: &TrackedEpic,
        resolution: &EpicResolution,
        index: &StateIndex,
        directory: &MemberDirectory,
    ) -> Result<()> {
        let resolved = match resolution {
            EpicResolution::NotFound { name } => {
                writeln!(
                    self.writer,
                    r##"<text x="{MARGIN:.0}" y="{:.0}" font-size="14" fill="#b91c1c">{}: no matching epic found</text>"##,
                    y + 28.0,
                    encode_text(name)
                )?;
                return Ok(());
            }
            EpicResolution::Found(resolved) => resolved,
        };

        let epic_state = resolved.epic.state.as_deref().unwrap_or("unknown");
        let Some(stories) = &resolved.stories else {
            writeln!(
                self.writer,
                r##"<text x="{MARGIN:.0}" y="{:.0}" font-size="16" font-weight="600" fill="#111827">{}</text>"##,
                y + 28.0,
                encode_text(&resolved.epic.name)
            )?;
            writeln!(
                self.writer,
                r##"<text x="{MARGIN:.0}" y="{:.0}" font-size="11" fill="#9ca3af">stories unavailable</text>"##,
                y + 46.0
            )?;
            return Ok(());
        };

        writeln!(
            self.writer,
            r##"<text x="{MARGIN:.0}" y="{:.0}" font-size="16" font-weight="600" fill="#111827">{}</text>"##,
            y + 28.0,
            encode_text(&resolved.epic.name)
        )?;
        writeln!(
            self.writer,
            r##"<text x="{MARGIN:.0}" y="{:.0}" font-size="11" fill="#6b7280">{} · {} stories</text>"##,
            y + 44.0,
            encode_text(epic_state),
            stories.len()
        )?;

        let charts_y = y + 70.0;
        let state_segments = aggregate::state_segments(stories, index);
        self.write_pie(MARGIN, charts_y, "By state", &state_segments, state_color)?;

        let type_segments = aggregate::count_by_type(stories).segments();
        self.write_pie(320.0, charts_y, "By type", &type_segments, type_color)?;

        if epic_cfg.team.is_empty() {
            writeln!(
                self.writer,
                r##"<text x="620" y="{:.0}" font-size="11" fill="#9ca3af">no team roster configured</text>"##,
                charts_y + 80.0
            )?;
        } else {
            let open = aggregate::count_open_by_roster(stories, &epic_cfg.team, directory, index);
            let total: usize = open.iter().map(|(_, count)| count).sum();
            let segments: Vec<Segment> = open
                .into_iter()
                .map(|(name, count)| Segment {
                    key: name,
                    count,
                    percentage: aggregate::percentage(count, total),
                })
                .collect();
            self.write_columns(620.0, charts_y, "Open by team", &segments)?;
        }
        Ok(())
    }

    /// One pie with its legend. The legend lists every segment, including
    /// zero-count ones that drew no slice.
    fn write_pie(
        &mut self,
        x: f64,
        y: f64,
        title: &str,
        segments: &[Segment],
        color: fn(&str) -> &'static str,
    ) -> Result<()> {
        writeln!(self.writer, r##"<g transform="translate({x:.0} {y:.0})">"##)?;
        writeln!(
            self.writer,
            r##"<text x="100" y="-8" text-anchor="middle" font-size="13" fill="#374151">{}</text>"##,
            encode_text(title)
        )?;

        let slices = chart::layout_pie(segments);
        if slices.is_empty() {
            writeln!(self.writer, r##"<circle cx="100" cy="100" r="90" fill="#f3f4f6"/>"##)?;
            writeln!(
                self.writer,
                r##"<text x="100" y="104" text-anchor="middle" font-size="11" fill="#9ca3af">no data</text>"##
            )?;
        }
        for slice in &slices {
            writeln!(
                self.writer,
                r##"<path d="{}" fill="{}" stroke="#ffffff" stroke-width="1"/>"##,
                slice.path_data,
                color(&slice.key)
            )?;
        }

        let mut legend_y = 215.0;
        for segment in segments {
            writeln!(
                self.writer,
                r##"<rect x="0" y="{legend_y:.0}" width="10" height="10" fill="{}"/>"##,
                color(&segment.key)
            )?;
            writeln!(
                self.writer,
                r##"<text x="16" y="{:.0}" font-size="11" fill="#374151">{} {} ({:.0}%)</text>"##,
                legend_y + 9.0,
                encode_text(&segment.key),
                segment.count,
                segment.percentage
            )?;
            legend_y += 15.0;
        }
        writeln!(self.writer, "</g>")?;
        Ok(())
    }

    fn write_columns(&mut self, x: f64, y: f64, title: &str, segments: &[Segment]) -> Result<()> {
        writeln!(self.writer, r##"<g transform="translate({x:.0} {y:.0})">"##)?;
        writeln!(
            self.writer,
            r##"<text x="{:.0}" y="-8" text-anchor="middle" font-size="13" fill="#374151">{}</text>"##,
            COLUMN_CHART_W / 2.0,
            encode_text(title)
        )?;
        writeln!(
            self.writer,
            r##"<line x1="0" y1="{COLUMN_CHART_H:.0}" x2="{COLUMN_CHART_W:.0}" y2="{COLUMN_CHART_H:.0}" stroke="#d1d5db"/>"##
        )?;

        let bars = chart::layout_bars(segments);
        let slot = COLUMN_CHART_W / bars.len().max(1) as f64;
        for (i, (bar, segment)) in bars.iter().zip(segments).enumerate() {
            let bar_height = bar.height_percent / 100.0 * COLUMN_CHART_H;
            let bar_width = (slot * 0.6).min(48.0);
            let bar_x = i as f64 * slot + (slot - bar_width) / 2.0;
            let bar_y = COLUMN_CHART_H - bar_height;
            if bar_height > 0.0 {
                writeln!(
                    self.writer,
                    r##"<rect x="{bar_x:.1}" y="{bar_y:.1}" width="{bar_width:.1}" height="{bar_height:.1}" fill="#6366f1"/>"##
                )?;
            }
            writeln!(
                self.writer,
                r##"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="10" fill="#374151">{}</text>"##,
                bar_x + bar_width / 2.0,
                bar_y - 4.0,
                segment.count
            )?;
            writeln!(
                self.writer,
                r##"<text x="{:.1}" y="{:.0}" text-anchor="middle" font-size="10" fill="#6b7280">{}</text>"##,
                bar_x + bar_width / 2.0,
                COLUMN_CHART_H + 14.0,
                encode_text(&truncate_label(&segment.key, 12))
            )?;
        }
        writeln!(self.writer, "</g>")?;
        Ok(())
    }
}

fn row_height(resolution: &EpicResolution) -> f64 {
    match resolution {
        EpicResolution::Found(resolved) if resolved.stories.is_some() => ROW_FULL,
        EpicResolution::Found(_) => ROW_DEGRADED,
        EpicResolution::NotFound { .. } => ROW_MISSING,
    }
}

fn state_color(label: &str) -> &'static str {
    match CanonicalState::parse(label) {
        Some(CanonicalState::Backlog) => "#9ca3af",
        Some(CanonicalState::ReadyForDevelopment) => "#60a5fa",
        Some(CanonicalState::InDevelopment) => "#fbbf24",
        Some(CanonicalState::InReview) => "#a78bfa",
        Some(CanonicalState::ReadyForRelease) => "#34d399",
        Some(CanonicalState::Complete) => "#10b981",
        None => "#d1d5db",
    }
}

fn type_color(key: &str) -> &'static str {
    match key {
        "feature" => "#3b82f6",
        "chore" => "#f59e0b",
        "bug" => "#ef4444",
        _ => "#d1d5db",
    }
}

fn truncate_label(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        label.to_string()
    } else {
        let head: String = label.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
