//! Material time series and their tab-separated file format.
//!
//! Tables carry a header row. Material tables use the column order
//! `timestamp, volume, <parameters...>`; deposition paths use
//! `timestamp, x, z`; merged material-deposition tables use
//! `timestamp, x, z, volume, <parameters...>`.

use crate::error::{SimError, SimResult};
use crate::stacker::StackEvent;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// One sample of a material stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialRow {
    pub timestamp: f64,
    pub volume: f64,
    pub parameters: Vec<f64>,
}

/// A material stream: volume and quality over time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialSeries {
    pub parameter_names: Vec<String>,
    pub rows: Vec<MaterialRow>,
}

/// Output of a stack-and-reclaim run, same layout as any material stream.
pub type ReclaimedMaterial = MaterialSeries;

impl MaterialSeries {
    pub fn new(parameter_names: Vec<String>) -> Self {
        Self {
            parameter_names,
            rows: Vec::new(),
        }
    }

    pub fn total_volume(&self) -> f64 {
        self.rows.iter().map(|r| r.volume).sum()
    }

    /// Values of one parameter column, `None` if any row lacks it.
    pub fn parameter_column(&self, parameter: usize) -> Option<Vec<f64>> {
        if parameter >= self.parameter_names.len() {
            return None;
        }
        self.rows
            .iter()
            .map(|r| r.parameters.get(parameter).copied())
            .collect()
    }

    /// Volume-weighted mean of one parameter. `None` for an empty stream or
    /// a parameter the stream does not carry.
    pub fn parameter_mean(&self, parameter: usize) -> Option<f64> {
        let values = self.parameter_column(parameter)?;
        let total = self.total_volume();
        if total <= 0.0 {
            return None;
        }
        let weighted: f64 = self
            .rows
            .iter()
            .zip(&values)
            .map(|(r, v)| r.volume * v)
            .sum();
        Some(weighted / total)
    }

    pub fn read_tsv<R: Read>(reader: R) -> SimResult<Self> {
        let (header, records) = read_table(reader, 2)?;
        let rows = records
            .into_iter()
            .map(|values| MaterialRow {
                timestamp: values[0],
                volume: values[1],
                parameters: values[2..].to_vec(),
            })
            .collect();
        Ok(Self {
            parameter_names: header[2..].to_vec(),
            rows,
        })
    }

    pub fn write_tsv<W: Write>(&self, writer: W) -> SimResult<()> {
        let mut header = vec!["timestamp".to_string(), "volume".to_string()];
        header.extend(self.parameter_names.iter().cloned());
        write_table(
            writer,
            &header,
            self.rows.iter().map(|r| {
                let mut values = vec![r.timestamp, r.volume];
                values.extend_from_slice(&r.parameters);
                values
            }),
        )
    }

    pub fn load_tsv(path: &Path) -> SimResult<Self> {
        Self::read_tsv(File::open(path)?)
    }

    pub fn save_tsv(&self, path: &Path) -> SimResult<()> {
        self.write_tsv(File::create(path)?)
    }
}

/// Stacker position at one instant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepositionPoint {
    pub timestamp: f64,
    pub x: f64,
    pub z: f64,
}

/// Stacker position over time, sorted by timestamp.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DepositionPath {
    points: Vec<DepositionPoint>,
}

impl DepositionPath {
    pub fn new(mut points: Vec<DepositionPoint>) -> Self {
        points.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Self { points }
    }

    pub fn points(&self) -> &[DepositionPoint] {
        &self.points
    }

    /// Linearly interpolated position, held constant outside the path.
    pub fn position_at(&self, timestamp: f64) -> Option<(f64, f64)> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        if timestamp <= first.timestamp {
            return Some((first.x, first.z));
        }
        if timestamp >= last.timestamp {
            return Some((last.x, last.z));
        }

        let i = self.points.partition_point(|p| p.timestamp <= timestamp);
        let a = self.points[i - 1];
        let b = self.points[i];
        let span = b.timestamp - a.timestamp;
        if span <= 0.0 {
            return Some((a.x, a.z));
        }
        let t = (timestamp - a.timestamp) / span;
        Some((a.x + (b.x - a.x) * t, a.z + (b.z - a.z) * t))
    }

    pub fn read_tsv<R: Read>(reader: R) -> SimResult<Self> {
        let (_, records) = read_table(reader, 3)?;
        Ok(Self::new(
            records
                .into_iter()
                .map(|v| DepositionPoint {
                    timestamp: v[0],
                    x: v[1],
                    z: v[2],
                })
                .collect(),
        ))
    }

    pub fn load_tsv(path: &Path) -> SimResult<Self> {
        Self::read_tsv(File::open(path)?)
    }
}

/// Material stream with the stacker position resolved for every row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialDeposition {
    pub parameter_names: Vec<String>,
    pub rows: Vec<StackEvent>,
}

impl MaterialDeposition {
    pub fn new(parameter_names: Vec<String>, rows: Vec<StackEvent>) -> Self {
        Self {
            parameter_names,
            rows,
        }
    }

    /// Place every material sample at the stacker position of its timestamp.
    pub fn from_series(material: &MaterialSeries, path: &DepositionPath) -> SimResult<Self> {
        let rows = material
            .rows
            .iter()
            .map(|row| {
                let (x, z) = path
                    .position_at(row.timestamp)
                    .ok_or_else(|| SimError::Table("empty deposition path".to_string()))?;
                Ok(StackEvent::new(
                    row.timestamp,
                    x,
                    z,
                    row.volume,
                    row.parameters.clone(),
                ))
            })
            .collect::<SimResult<Vec<_>>>()?;

        Ok(Self {
            parameter_names: material.parameter_names.clone(),
            rows,
        })
    }

    /// The material stream without positions.
    pub fn material(&self) -> MaterialSeries {
        MaterialSeries {
            parameter_names: self.parameter_names.clone(),
            rows: self
                .rows
                .iter()
                .map(|e| MaterialRow {
                    timestamp: e.timestamp,
                    volume: e.volume,
                    parameters: e.parameters.clone(),
                })
                .collect(),
        }
    }

    pub fn read_tsv<R: Read>(reader: R) -> SimResult<Self> {
        let (header, records) = read_table(reader, 4)?;
        let rows = records
            .into_iter()
            .map(|v| StackEvent::new(v[0], v[1], v[2], v[3], v[4..].to_vec()))
            .collect();
        Ok(Self {
            parameter_names: header[4..].to_vec(),
            rows,
        })
    }

    pub fn write_tsv<W: Write>(&self, writer: W) -> SimResult<()> {
        let mut header: Vec<String> = ["timestamp", "x", "z", "volume"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        header.extend(self.parameter_names.iter().cloned());
        write_table(
            writer,
            &header,
            self.rows.iter().map(|e| {
                let mut values = vec![e.timestamp, e.x, e.z, e.volume];
                values.extend_from_slice(&e.parameters);
                values
            }),
        )
    }

    pub fn load_tsv(path: &Path) -> SimResult<Self> {
        Self::read_tsv(File::open(path)?)
    }

    pub fn save_tsv(&self, path: &Path) -> SimResult<()> {
        self.write_tsv(File::create(path)?)
    }
}

/// Parse a numeric TSV table with at least `fixed` columns.
fn read_table<R: Read>(reader: R, fixed: usize) -> SimResult<(Vec<String>, Vec<Vec<f64>>)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(reader);

    let header: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if header.len() < fixed {
        return Err(SimError::Table(format!(
            "expected at least {} columns, header has {}",
            fixed,
            header.len()
        )));
    }

    let mut records = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let values = record
            .iter()
            .map(|field| {
                field.trim().parse::<f64>().map_err(|_| {
                    SimError::Table(format!("row {}: '{}' is not a number", line + 1, field))
                })
            })
            .collect::<SimResult<Vec<f64>>>()?;
        records.push(values);
    }
    Ok((header, records))
}

fn write_table<W, I>(writer: W, header: &[String], rows: I) -> SimResult<()>
where
    W: Write,
    I: Iterator<Item = Vec<f64>>,
{
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
