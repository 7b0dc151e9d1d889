//! Live gas-concentration history.
//!
//! While a run measures, the stream piggybacks per-component readings
//! ([`LiveBlock`](crate::data::event::LiveBlock)). This module keeps a
//! bounded plot series per component plus the flat row log that the CSV
//! export writes out. Components appear in first-seen order and keep that
//! order for both the chart legend and the export columns.

use std::collections::{HashMap, VecDeque};

use chrono::NaiveDateTime;

use crate::data::event::LiveBlock;

/// Wall-clock format the backend uses for sample timestamps.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One appended sample row, the shape the CSV export needs.
#[derive(Debug, Clone)]
pub struct LiveRow {
    pub timestamp: String,
    pub phase: String,
    /// 1-based channel number, when reported.
    pub channel: Option<u32>,
    /// 1-based repeat number, when reported.
    pub repeat: Option<u32>,
    /// ppm per component label.
    pub ppm: HashMap<String, f64>,
}

/// Plot series of one gas component.
#[derive(Debug, Clone)]
pub struct ComponentSeries {
    pub label: String,
    /// Device-reported colour as `#rrggbb`, when given.
    pub color: Option<String>,
    /// CAS registry number, when known.
    pub cas: Option<String>,
    /// Chart visibility toggle.
    pub visible: bool,
    /// Points `[t_unix_seconds, ppm]`.
    pub points: VecDeque<[f64; 2]>,
}

/// Bounded history of live samples.
#[derive(Debug)]
pub struct LiveHistory {
    series: Vec<ComponentSeries>,
    index: HashMap<String, usize>,
    rows: VecDeque<LiveRow>,
    max_points: usize,
    max_rows: usize,
}

impl LiveHistory {
    /// `max_points` bounds each component's plot series, `max_rows` the
    /// export log.
    pub fn new(max_points: usize, max_rows: usize) -> Self {
        Self {
            series: Vec::new(),
            index: HashMap::new(),
            rows: VecDeque::new(),
            max_points: max_points.max(1),
            max_rows: max_rows.max(1),
        }
    }

    /// Append one live block. Unknown component labels create new series.
    pub fn push(&mut self, block: &LiveBlock) {
        let t = Self::timestamp_seconds(&block.timestamp)
            .unwrap_or_else(|| chrono::Local::now().timestamp() as f64);

        let mut ppm = HashMap::with_capacity(block.components.len());
        for comp in &block.components {
            let idx = match self.index.get(&comp.label) {
                Some(idx) => *idx,
                None => {
                    let idx = self.series.len();
                    self.series.push(ComponentSeries {
                        label: comp.label.clone(),
                        color: None,
                        cas: None,
                        visible: true,
                        points: VecDeque::new(),
                    });
                    self.index.insert(comp.label.clone(), idx);
                    idx
                }
            };
            let series = &mut self.series[idx];
            // The device may start sending colour/CAS later than the data.
            if series.color.is_none() {
                series.color = comp.color.clone();
            }
            if series.cas.is_none() {
                series.cas = comp.cas.clone();
            }
            series.points.push_back([t, comp.ppm]);
            while series.points.len() > self.max_points {
                series.points.pop_front();
            }
            ppm.insert(comp.label.clone(), comp.ppm);
        }

        self.rows.push_back(LiveRow {
            timestamp: block.timestamp.clone(),
            phase: block.phase.clone().unwrap_or_default(),
            channel: block.channel,
            repeat: block.repeat,
            ppm,
        });
        while self.rows.len() > self.max_rows {
            self.rows.pop_front();
        }
    }

    /// All series, first-seen order.
    pub fn series(&self) -> &[ComponentSeries] {
        &self.series
    }

    /// Mutable access for visibility toggles.
    pub fn series_mut(&mut self) -> &mut [ComponentSeries] {
        &mut self.series
    }

    /// Component labels, first-seen order (the export column order).
    pub fn labels(&self) -> Vec<String> {
        self.series.iter().map(|s| s.label.clone()).collect()
    }

    /// Logged rows, oldest first.
    pub fn rows(&self) -> impl Iterator<Item = &LiveRow> {
        self.rows.iter()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drop all samples. Labels, colours and visibility survive so the
    /// chart legend stays stable across runs.
    pub fn clear(&mut self) {
        for series in &mut self.series {
            series.points.clear();
        }
        self.rows.clear();
    }

    fn timestamp_seconds(ts: &str) -> Option<f64> {
        NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT)
            .ok()
            .map(|dt| dt.and_utc().timestamp() as f64)
    }
}
