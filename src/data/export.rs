//! CSV export of the live sample log.
//!
//! Wide layout, tab-delimited: one row per sample, the fixed columns first,
//! then one ppm column per component label in first-seen order. Readings a
//! row never reported stay empty rather than zero.

use std::io::Write;
use std::path::Path;

use crate::data::live::LiveHistory;

/// Write the whole row log as tab-separated CSV.
pub fn write_live_csv<P: AsRef<Path>>(history: &LiveHistory, path: P) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    let mut out = std::io::BufWriter::new(file);
    let labels = history.labels();

    write!(out, "timestamp\tphase\tchannel\trepeat")?;
    for label in &labels {
        write!(out, "\t{label}")?;
    }
    writeln!(out)?;

    for row in history.rows() {
        write!(
            out,
            "{}\t{}\t{}\t{}",
            row.timestamp,
            row.phase,
            row.channel.map(|c| c.to_string()).unwrap_or_default(),
            row.repeat.map(|r| r.to_string()).unwrap_or_default(),
        )?;
        for label in &labels {
            match row.ppm.get(label) {
                Some(ppm) => write!(out, "\t{ppm:.3}")?,
                None => write!(out, "\t")?,
            }
        }
        writeln!(out)?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::event::{GasComponent, LiveBlock};

    fn sample(ts: &str, channel: u32, parts: &[(&str, f64)]) -> LiveBlock {
        LiveBlock {
            timestamp: ts.to_string(),
            phase: Some("MEASURING".to_string()),
            channel: Some(channel),
            repeat: Some(1),
            components: parts
                .iter()
                .map(|(label, ppm)| GasComponent {
                    label: label.to_string(),
                    ppm: *ppm,
                    color: None,
                    cas: None,
                })
                .collect(),
        }
    }

    #[test]
    fn wide_csv_layout() {
        let mut history = LiveHistory::new(100, 100);
        history.push(&sample("2026-03-01 10:00:00", 1, &[("CH4", 1.5), ("CO2", 412.0)]));
        history.push(&sample("2026-03-01 10:00:05", 2, &[("CH4", 1.6)]));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.csv");
        write_live_csv(&history, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp\tphase\tchannel\trepeat\tCH4\tCO2");
        assert_eq!(lines[1], "2026-03-01 10:00:00\tMEASURING\t1\t1\t1.500\t412.000");
        // Missing CO2 reading leaves the cell empty.
        assert_eq!(lines[2], "2026-03-01 10:00:05\tMEASURING\t2\t1\t1.600\t");
    }

    #[test]
    fn empty_history_writes_header_only() {
        let history = LiveHistory::new(100, 100);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_live_csv(&history, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "timestamp\tphase\tchannel\trepeat\n");
    }
}
