//! Table region detection by geometric clustering of raw lines.
//!
//! Lines are grouped into rows by their quantized vertical center. A row
//! whose segments are spaced regularly is a candidate table row, and runs of
//! consecutive candidate rows become table regions.

use std::collections::{BTreeMap, HashSet};

use super::{InferenceConfig, TablePredictor, TableRegion};
use crate::model::{BoundingBox, RawLine, TableCell};

/// A whitespace-delimited piece of a line with an estimated horizontal extent.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub x0: f64,
    pub x1: f64,
    /// Line the segment was cut from
    pub line_index: usize,
}

/// Lines sharing a quantized vertical center.
#[derive(Debug, Clone)]
pub struct RowData {
    /// Quantized vertical center
    pub key: i64,
    /// Member lines, sorted left to right
    pub line_indices: Vec<usize>,
    /// Segments of all member lines, left to right
    pub segments: Vec<Segment>,
}

/// Cut a line into segments at whitespace runs of at least `min_gap_chars`
/// characters (or any run containing a tab).
///
/// With the default of two, single spaces never split a line, so
/// `"10 20 30"` stays one segment and prose is not read as table rows.
/// Set `min_gap_chars` to one to split on every whitespace run.
///
/// Horizontal positions are interpolated from the character offsets.
pub fn split_segments(line: &RawLine, line_index: usize, min_gap_chars: usize) -> Vec<Segment> {
    let chars: Vec<char> = line.text.chars().collect();
    let n = chars.len();
    if n == 0 {
        return Vec::new();
    }
    let left = line.bbox[0].min(line.bbox[2]);
    let char_width = (line.bbox[2] - line.bbox[0]).abs() / n as f64;
    let make = |start: usize, end: usize| Segment {
        text: chars[start..end].iter().collect(),
        x0: left + start as f64 * char_width,
        x1: left + end as f64 * char_width,
        line_index,
    };

    let mut segments = Vec::new();
    let mut seg_start: Option<usize> = None;
    let mut i = 0;
    while i < n {
        if !chars[i].is_whitespace() {
            if seg_start.is_none() {
                seg_start = Some(i);
            }
            i += 1;
            continue;
        }
        let run_start = i;
        let mut has_tab = false;
        while i < n && chars[i].is_whitespace() {
            has_tab |= chars[i] == '\t';
            i += 1;
        }
        if let Some(start) = seg_start {
            if i - run_start >= min_gap_chars || has_tab || i == n {
                segments.push(make(start, run_start));
                seg_start = None;
            }
        }
    }
    if let Some(start) = seg_start {
        segments.push(make(start, n));
    }
    segments
}

/// Detects table regions in a page's raw lines.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: InferenceConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: InferenceConfig) -> Self {
        Self { config }
    }

    /// Detect table regions on one page.
    pub fn detect(&self, lines: &[RawLine], page_width: f64, page_height: f64) -> Vec<TableRegion> {
        if !(page_height.is_finite() && page_height > 0.0 && page_width.is_finite()) {
            log::warn!(
                "TableDetector: unusable page size {}x{}, skipping page",
                page_width,
                page_height
            );
            return Vec::new();
        }

        let rows = self.group_into_rows(lines);
        log::debug!(
            "TableDetector: grouped {} lines into {} rows",
            lines.len(),
            rows.len()
        );
        if rows.len() < self.config.min_table_rows {
            return Vec::new();
        }

        let mut regions: Vec<TableRegion> = self
            .find_table_regions(&rows)
            .into_iter()
            .filter_map(|(start, end)| self.build_region(lines, &rows[start..=end]))
            .collect();
        log::debug!("TableDetector: found {} table regions", regions.len());

        let used: HashSet<usize> = regions
            .iter()
            .flat_map(|r| r.line_indices.iter().copied())
            .collect();
        for region in &mut regions {
            if let Some((index, text)) = self.find_caption(lines, &used, region, page_height) {
                region.caption = Some(text);
                region.caption_line = Some(index);
            }
        }
        regions
    }

    /// Group lines into rows by quantized vertical center, top to bottom.
    pub fn group_into_rows(&self, lines: &[RawLine]) -> Vec<RowData> {
        let mut buckets: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (index, line) in lines.iter().enumerate() {
            if line.is_blank() || !line.bbox.iter().all(|v| v.is_finite()) {
                continue;
            }
            let center = (line.bbox[1] + line.bbox[3]) / 2.0;
            let key = (center / self.config.row_quantum).round() as i64;
            buckets.entry(key).or_default().push(index);
        }

        buckets
            .into_iter()
            .map(|(key, mut line_indices)| {
                line_indices.sort_by(|&a, &b| lines[a].bbox[0].total_cmp(&lines[b].bbox[0]));
                let segments = line_indices
                    .iter()
                    .flat_map(|&i| split_segments(&lines[i], i, self.config.min_gap_chars))
                    .collect();
                RowData {
                    key,
                    line_indices,
                    segments,
                }
            })
            .collect()
    }

    /// Whether a row has enough regularly spaced segments.
    pub fn is_candidate_row(&self, row: &RowData) -> bool {
        if row.segments.len() < self.config.min_segments {
            return false;
        }
        let gaps: Vec<f64> = row
            .segments
            .windows(2)
            .map(|pair| pair[1].x0 - pair[0].x1)
            .collect();
        let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
        if mean.is_nan() || mean <= 0.0 {
            return false;
        }
        let variance = gaps.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / gaps.len() as f64;
        variance.sqrt() < self.config.gap_stddev_ratio * mean
    }

    /// Runs of consecutive candidate rows, as inclusive `(start, end)` row indices.
    pub fn find_table_regions(&self, rows: &[RowData]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut run_start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            let candidate = self.is_candidate_row(row);
            match (candidate, run_start) {
                (true, None) => run_start = Some(i),
                (false, Some(start)) => {
                    self.push_run(&mut regions, start, i - 1);
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            self.push_run(&mut regions, start, rows.len() - 1);
        }
        regions
    }

    fn push_run(&self, regions: &mut Vec<(usize, usize)>, start: usize, end: usize) {
        if end + 1 - start >= self.config.min_table_rows {
            regions.push((start, end));
        }
    }

    /// Most rows must have a segment count within one of the mean.
    fn is_consistent(&self, rows: &[RowData]) -> bool {
        let counts: Vec<f64> = rows.iter().map(|r| r.segments.len() as f64).collect();
        let mean = counts.iter().sum::<f64>() / counts.len() as f64;
        let consistent = counts.iter().filter(|c| (*c - mean).abs() <= 1.0).count();
        consistent as f64 / counts.len() as f64 >= self.config.min_row_consistency
    }

    fn build_region(&self, lines: &[RawLine], rows: &[RowData]) -> Option<TableRegion> {
        if !self.is_consistent(rows) {
            log::debug!("TableDetector: skipping region, inconsistent column counts");
            return None;
        }

        let num_cols = column_mode(rows);
        let mut cells = Vec::new();
        for (r, row) in rows.iter().enumerate() {
            let actual = row.segments.len();
            for (c, segment) in row.segments.iter().enumerate() {
                let line = &lines[segment.line_index];
                let mut cell = TableCell::new(segment.text.as_str(), r, c).with_bbox([
                    segment.x0,
                    line.bbox[1].min(line.bbox[3]),
                    segment.x1,
                    line.bbox[1].max(line.bbox[3]),
                ]);
                if actual < num_cols && c + 1 == actual {
                    let span = (num_cols as f64 / actual as f64).round() as usize;
                    cell = cell.with_colspan(span);
                }
                cells.push(cell);
            }
        }

        let mut line_indices: Vec<usize> = rows
            .iter()
            .flat_map(|r| r.line_indices.iter().copied())
            .collect();
        line_indices.sort_unstable();
        let bbox = line_indices
            .iter()
            .map(|&i| BoundingBox::from_array(lines[i].bbox, 0))
            .reduce(|acc, b| acc.union(&b))?;

        Some(TableRegion {
            bbox,
            num_rows: rows.len(),
            num_cols,
            cells,
            line_indices,
            caption: None,
            caption_line: None,
            confidence: self.config.table_confidence,
        })
    }

    /// Best caption line near a region, as `(line index, text)`.
    fn find_caption(
        &self,
        lines: &[RawLine],
        used: &HashSet<usize>,
        region: &TableRegion,
        page_height: f64,
    ) -> Option<(usize, String)> {
        let margin = region.bbox.width() * self.config.caption_horizontal_margin;
        let reach = page_height * self.config.caption_vertical_ratio;
        let mut best: Option<(f64, usize)> = None;

        for (index, line) in lines.iter().enumerate() {
            if used.contains(&index) || line.is_blank() {
                continue;
            }
            let bbox = BoundingBox::from_array(line.bbox, 0);
            if !bbox.is_valid() {
                continue;
            }
            let center_x = bbox.center_x();
            if center_x < region.bbox.x0 - margin || center_x > region.bbox.x1 + margin {
                continue;
            }
            let distance = if bbox.y1 <= region.bbox.y0 {
                region.bbox.y0 - bbox.y1
            } else if bbox.y0 >= region.bbox.y1 {
                bbox.y0 - region.bbox.y1
            } else {
                continue;
            };
            if distance > reach {
                continue;
            }

            let base = if line.text.trim().to_lowercase().starts_with("table") {
                self.config.caption_keyword_score
            } else {
                self.config.caption_other_score
            };
            let score = base - self.config.caption_distance_weight * (distance / page_height);
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, index));
            }
        }

        best.map(|(_, index)| (index, lines[index].text.trim().to_string()))
    }
}

impl TablePredictor for TableDetector {
    fn predict(&self, lines: &[RawLine], page_width: f64, page_height: f64) -> Vec<TableRegion> {
        self.detect(lines, page_width, page_height)
    }
}

/// Most frequent segment count; ties go to the smaller count.
fn column_mode(rows: &[RowData]) -> usize {
    let mut frequency: BTreeMap<usize, usize> = BTreeMap::new();
    for row in rows {
        *frequency.entry(row.segments.len()).or_default() += 1;
    }
    let mut mode = (0, 0);
    for (count, freq) in frequency {
        if freq > mode.1 {
            mode = (count, freq);
        }
    }
    mode.0
}
