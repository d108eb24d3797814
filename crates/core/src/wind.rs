//! Wind time series for the speed and direction ramps
//!
//! The wind file is a CSV of `time [s], speed [m/s], direction [deg]` rows
//! after one header row. Malformed rows are kept as [`WindRowError`]s and
//! reported in the deck; they never fail the export.

use crate::error::{ExportError, Result, WindRowError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One wind sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindSample {
    /// Time from the start of the simulation (s)
    pub time: f64,
    /// Speed (m/s)
    pub speed: f64,
    /// Direction the wind blows from (deg, meteorological)
    pub direction: f64,
}

impl WindSample {
    pub fn new(time: f64, speed: f64, direction: f64) -> Self {
        Self {
            time,
            speed,
            direction,
        }
    }
}

/// Where a time series came from.
#[derive(Debug, Clone, PartialEq)]
pub enum WindSource {
    /// Built-in three point ramp
    Default,
    File(PathBuf),
}

/// Parsed wind samples plus the rows that could not be used.
#[derive(Debug, Clone, PartialEq)]
pub struct WindTimeSeries {
    pub source: WindSource,
    pub samples: Vec<WindSample>,
    pub rejected: Vec<WindRowError>,
}

impl Default for WindTimeSeries {
    fn default() -> Self {
        Self {
            source: WindSource::Default,
            samples: vec![
                WindSample::new(0.0, 10.0, 315.0),
                WindSample::new(600.0, 10.0, 270.0),
                WindSample::new(1200.0, 20.0, 360.0),
            ],
            rejected: Vec::new(),
        }
    }
}

fn parse_row(line: usize, raw: &str) -> std::result::Result<WindSample, WindRowError> {
    let reject = |reason: String| WindRowError {
        line,
        raw: raw.to_string(),
        reason,
    };
    let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
    if fields.len() != 3 {
        return Err(reject(format!("expected 3 fields, found {}", fields.len())));
    }
    let mut values = [0.0; 3];
    let names = ["time", "speed", "direction"];
    for ((value, field), name) in values.iter_mut().zip(&fields).zip(names) {
        *value = field
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| reject(format!("{name} <{field}> is not a number")))?;
    }
    Ok(WindSample::new(values[0], values[1], values[2]))
}

impl WindTimeSeries {
    /// Parse CSV text, skipping the header row and blank lines.
    pub fn parse(text: &str, source: WindSource) -> Self {
        let mut samples = Vec::new();
        let mut rejected = Vec::new();
        for (idx, raw) in text.lines().enumerate().skip(1) {
            if raw.trim().is_empty() {
                continue;
            }
            match parse_row(idx + 1, raw) {
                Ok(sample) => samples.push(sample),
                Err(e) => {
                    warn!("Wind file {e}, row skipped");
                    rejected.push(e);
                }
            }
        }
        debug!(
            samples = samples.len(),
            rejected = rejected.len(),
            "Wind time series parsed"
        );
        Self {
            source,
            samples,
            rejected,
        }
    }

    /// Read and parse a wind CSV file.
    ///
    /// # Errors
    /// `WindFile` if the file cannot be read.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ExportError::WindFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text, WindSource::File(path.to_path_buf())))
    }

    /// File series if a path is given, the default ramp otherwise.
    ///
    /// # Errors
    /// As [`WindTimeSeries::from_file`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
