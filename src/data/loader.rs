use std::path::Path;

use crate::data::buffer::{InMemoryRecording, SignalBuffer};
use crate::data::channel_type::infer_channel_type;
use crate::error::{Result, StackError};

/// Load a CSV recording: one column per channel, an optional time column,
/// and an optional second header row carrying per-channel type tags.
pub fn load_file(path: &Path, default_sample_rate: f64) -> Result<InMemoryRecording> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" | "txt" => {
            let content = std::fs::read(path)
                .map_err(|e| StackError::Load(format!("cannot read file: {e}")))?;
            let text = String::from_utf8(content.clone())
                .unwrap_or_else(|_| content.iter().map(|&b| b as char).collect());
            let recording = parse_csv(&text, default_sample_rate)?;
            tracing::info!(
                "Loaded {} channels x {} samples from {:?}",
                recording.names.len(),
                recording.buffer.sample_count(),
                path
            );
            Ok(recording)
        }
        _ => Err(StackError::Load(format!("unsupported file format: .{ext}"))),
    }
}

/// Parse CSV text into an in-memory recording.
pub fn parse_csv(text: &str, default_sample_rate: f64) -> Result<InMemoryRecording> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut all_rows: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        match result {
            Ok(record) => {
                let row: Vec<String> = record.iter().map(|s| s.trim().to_string()).collect();
                if row.iter().any(|c| !c.is_empty()) {
                    all_rows.push(row);
                }
            }
            Err(e) => tracing::warn!("Skipping malformed CSV record: {e}"),
        }
    }

    let Some(header) = all_rows.first() else {
        return Err(StackError::Load("no data found".to_string()));
    };
    let columns = header.clone();
    let time_col = columns.iter().position(|c| is_time_column(c));

    // A second all-text row names the channel types.
    let tag_row = all_rows.get(1).filter(|row| {
        row.iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != time_col)
            .all(|(_, c)| !c.is_empty() && c.parse::<f64>().is_err())
    });
    let data_start = if tag_row.is_some() { 2 } else { 1 };
    let data_rows = &all_rows[data_start..];
    if data_rows.is_empty() {
        return Err(StackError::Load("no sample rows after header".to_string()));
    }

    // Convert to column-major format
    let mut column_data: Vec<Vec<String>> = vec![Vec::new(); columns.len()];
    for row in data_rows {
        for (col_idx, col) in column_data.iter_mut().enumerate() {
            col.push(row.get(col_idx).cloned().unwrap_or_default());
        }
    }

    let mut names = Vec::new();
    let mut tags = Vec::new();
    let mut rows = Vec::new();
    for (col_idx, name) in columns.iter().enumerate() {
        if Some(col_idx) == time_col {
            continue;
        }
        let (values, frac) = column_to_f64(&column_data[col_idx]);
        if frac < 0.5 {
            tracing::warn!("Column {name:?} is mostly non-numeric; skipping");
            continue;
        }
        let tag = tag_row
            .and_then(|row| row.get(col_idx))
            .map(|t| t.to_lowercase())
            .unwrap_or_else(|| infer_channel_type(name));
        names.push(name.clone());
        tags.push(Some(tag));
        rows.push(values);
    }

    if names.is_empty() {
        return Err(StackError::Load("no numeric channel columns".to_string()));
    }

    let buffer = match time_col {
        Some(idx) => {
            let (times, frac) = column_to_f64(&column_data[idx]);
            if frac < 1.0 {
                return Err(StackError::Load("time column contains non-numeric values".to_string()));
            }
            let rate = infer_sample_rate(&times).unwrap_or(default_sample_rate);
            SignalBuffer::with_times(rows, times, rate)?
        }
        None => SignalBuffer::new(rows, default_sample_rate, 0.0)?,
    };

    Ok(InMemoryRecording::new(names, Some(tags), buffer))
}

fn is_time_column(name: &str) -> bool {
    let lc = name.to_lowercase();
    lc == "t" || lc.contains("time") || lc == "seconds"
}

/// Sample rate from the mean spacing of a timestamp column.
fn infer_sample_rate(times: &[f64]) -> Option<f64> {
    if times.len() < 2 {
        return None;
    }
    let span = times[times.len() - 1] - times[0];
    if span > 0.0 && span.is_finite() {
        Some((times.len() - 1) as f64 / span)
    } else {
        None
    }
}

/// Extract numeric f64 values from a string column.
/// Returns (values, fraction_valid) where invalid entries become NaN.
pub fn column_to_f64(data: &[String]) -> (Vec<f64>, f64) {
    let mut values = Vec::with_capacity(data.len());
    let mut valid = 0usize;
    for s in data {
        match s.trim().parse::<f64>() {
            Ok(v) => {
                values.push(v);
                if v.is_finite() {
                    valid += 1;
                }
            }
            Err(_) => values.push(f64::NAN),
        }
    }
    let frac = if data.is_empty() { 0.0 } else { valid as f64 / data.len() as f64 };
    (values, frac)
}
