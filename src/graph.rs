// Temperature telemetry: repairing, parsing and charting the CSV logs the
// machines upload.
//
// Charts are SVG files with three series over a fixed 10 to 100 °F range.
// Hour gridlines are drawn, with a heavier line every four hours.

use chrono::{DateTime, NaiveDateTime};
use plotters::prelude::*;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Filename fragment that marks a temperature log.
pub const TEMPERATURE_MARKER: &str = "TEMPERATURE";

/// Year the logger glues to the previous field.
const YEAR_MARKER: &str = "2024";

const TIMESTAMP_COLUMN: &str = "Timestamp";
const REQUIRED_COLUMNS: [&str; 4] = [TIMESTAMP_COLUMN, "In 1 Temp", "In 2 Temp", "Out Temp"];

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
];

const HOUR: i64 = 3600;
const Y_RANGE: std::ops::Range<f64> = 10.0..100.0;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("failed to parse the CSV file: {0}")]
    Parse(#[from] csv::Error),

    #[error("CSV file has no '{0}' column")]
    MissingColumn(&'static str),

    #[error("unrecognised timestamp '{0}'")]
    Timestamp(String),

    #[error("CSV file has no data rows")]
    Empty,

    #[error("failed to render chart: {0}")]
    Render(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl GraphError {
    /// Malformed CSV, as opposed to everything else that can go wrong.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, GraphError::Parse(_))
    }
}

/// One row of a temperature log.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureSample {
    pub timestamp: NaiveDateTime,
    pub upper: f64,
    pub lower: f64,
    pub outside: f64,
}

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "In 1 Temp")]
    upper: f64,
    #[serde(rename = "In 2 Temp")]
    lower: f64,
    #[serde(rename = "Out Temp")]
    outside: f64,
}

/// Insert a comma before every year that is not already preceded by one.
///
/// Running it twice gives the same result as running it once.
pub fn repair_year_separators(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 16);
    let mut last = 0;
    for (idx, _) in raw.match_indices(YEAR_MARKER) {
        out.push_str(&raw[last..idx]);
        if !raw[..idx].ends_with(',') {
            out.push(',');
        }
        last = idx;
    }
    out.push_str(&raw[last..]);
    out
}

/// Parse a (repaired) temperature log, sorted by timestamp.
pub fn parse_temperature_csv(data: &str) -> Result<Vec<TemperatureSample>, GraphError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(GraphError::MissingColumn(column));
        }
    }

    let mut samples = Vec::new();
    for row in reader.deserialize::<Row>() {
        let row = row?;
        samples.push(TemperatureSample {
            timestamp: parse_timestamp(&row.timestamp)?,
            upper: row.upper,
            lower: row.lower,
            outside: row.outside,
        });
    }
    if samples.is_empty() {
        return Err(GraphError::Empty);
    }
    samples.sort_by_key(|s| s.timestamp);
    Ok(samples)
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, GraphError> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| GraphError::Timestamp(raw.to_string()))
}

/// Hour boundaries inside `[start, end]` (unix seconds), each flagged
/// `true` when it falls on a four-hour mark.
pub fn hour_gridlines(start: i64, end: i64) -> Vec<(i64, bool)> {
    let first = start.div_euclid(HOUR) * HOUR + if start.rem_euclid(HOUR) == 0 { 0 } else { HOUR };
    (0..)
        .map(|i| first + i * HOUR)
        .take_while(|t| *t <= end)
        .map(|t| (t, t.div_euclid(HOUR) % 4 == 0))
        .collect()
}

fn seconds(ts: &NaiveDateTime) -> i64 {
    ts.and_utc().timestamp()
}

fn clock_label(secs: &i64) -> String {
    DateTime::from_timestamp(*secs, 0)
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Draw the three temperature series to an SVG file at `out`.
pub fn render_chart(samples: &[TemperatureSample], title: &str, out: &Path) -> Result<(), GraphError> {
    let (first, last) = match (samples.first(), samples.last()) {
        (Some(f), Some(l)) => (seconds(&f.timestamp), seconds(&l.timestamp)),
        _ => return Err(GraphError::Empty),
    };
    let end = if last > first { last } else { first + HOUR };

    let root = SVGBackend::new(out, (1400, 700)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(first..end, Y_RANGE)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Timestamp")
        .y_desc("Temperature (F)")
        .x_labels(8)
        .x_label_formatter(&clock_label)
        .draw()
        .map_err(render_err)?;

    let minor = RGBColor(200, 200, 200);
    let major = RGBColor(128, 128, 128);
    chart
        .draw_series(hour_gridlines(first, end).into_iter().map(|(t, is_major)| {
            let style = if is_major { major.stroke_width(1) } else { minor.stroke_width(1) };
            PathElement::new(vec![(t, Y_RANGE.start), (t, Y_RANGE.end)], style)
        }))
        .map_err(render_err)?;

    let series: [(&str, RGBColor, fn(&TemperatureSample) -> f64); 3] = [
        ("Upper Temperature", BLUE, |s| s.upper),
        ("Lower Temperature", RED, |s| s.lower),
        ("Outside Temperature", GREEN, |s| s.outside),
    ];
    for (label, color, value) in series {
        chart
            .draw_series(LineSeries::new(
                samples.iter().map(|s| (seconds(&s.timestamp), value(s))),
                color.stroke_width(2),
            ))
            .map_err(render_err)?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

fn render_err<E: std::fmt::Display>(err: E) -> GraphError {
    GraphError::Render(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Timestamp,In 1 Temp,In 2 Temp,Out Temp
2024-03-02 05:00:00,38.5,36.1,70.2
2024-03-02 03:00:00,39.0,36.4,69.8
2024-03-02 04:00:00,38.7,36.0,70.0
";

    #[test]
    fn inserts_comma_before_glued_year() {
        assert_eq!(repair_year_separators("a,03:14:012024,b"), "a,03:14:01,2024,b");
    }

    #[test]
    fn repair_is_idempotent() {
        let once = repair_year_separators("x,03:14:012024,y,2024,z");
        assert_eq!(once, "x,03:14:01,2024,y,2024,z");
        assert_eq!(repair_year_separators(&once), once);
    }

    #[test]
    fn existing_separators_are_left_alone() {
        assert_eq!(repair_year_separators("a,2024,b"), "a,2024,b");
        assert_eq!(repair_year_separators("no year here"), "no year here");
    }

    #[test]
    fn parses_and_sorts_samples() {
        let samples = parse_temperature_csv(CSV).unwrap();
        assert_eq!(samples.len(), 3);
        assert!(samples.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(samples[0].upper, 39.0);
        assert_eq!(samples[2].outside, 70.2);
    }

    #[test]
    fn missing_column_is_not_a_parse_failure() {
        let err = parse_temperature_csv("Timestamp,In 1 Temp,Out Temp\n2024-03-02 05:00:00,1,2\n").unwrap_err();
        assert!(matches!(err, GraphError::MissingColumn("In 2 Temp")));
        assert!(!err.is_parse_failure());
    }

    #[test]
    fn ragged_rows_are_parse_failures() {
        let data = "Timestamp,In 1 Temp,In 2 Temp,Out Temp\n2024-03-02 05:00:00,1,2\n";
        assert!(parse_temperature_csv(data).unwrap_err().is_parse_failure());
    }

    #[test]
    fn non_numeric_temperature_is_a_parse_failure() {
        let data = "Timestamp,In 1 Temp,In 2 Temp,Out Temp\n2024-03-02 05:00:00,warm,2,3\n";
        assert!(parse_temperature_csv(data).unwrap_err().is_parse_failure());
    }

    #[test]
    fn bad_timestamp_is_reported() {
        let data = "Timestamp,In 1 Temp,In 2 Temp,Out Temp\nyesterday,1,2,3\n";
        assert!(matches!(parse_temperature_csv(data), Err(GraphError::Timestamp(_))));
    }

    #[test]
    fn gridlines_fall_on_hours_with_four_hour_majors() {
        // 1970-01-01 00:30 to 05:00
        let lines = hour_gridlines(1800, 5 * HOUR);
        let hours: Vec<i64> = lines.iter().map(|(t, _)| t / HOUR).collect();
        assert_eq!(hours, vec![1, 2, 3, 4, 5]);
        assert_eq!(lines.iter().filter(|(_, major)| *major).count(), 1);
        assert!(lines[3].1);
    }

    #[test]
    fn renders_svg_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("chart.svg");
        let samples = parse_temperature_csv(CSV).unwrap();
        render_chart(&samples, "Refrigerator Performance", &out).unwrap();
        let svg = std::fs::read_to_string(&out).unwrap();
        assert!(svg.contains("<svg"));
    }
}
