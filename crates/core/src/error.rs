//! Error taxonomy for the export pipeline
//!
//! Every fatal condition is an [`ExportError`] variant and aborts the run
//! before any output is written (configuration and data errors) or while
//! writing it (external I/O errors). Malformed wind rows are the only
//! recoverable condition and use [`WindRowError`], which never escalates.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error of a case export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A configuration value is outside its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The requested mesh count cannot produce a domain.
    #[error("invalid domain configuration: {0}")]
    InvalidDomainConfig(String),

    /// The domain has no extent along an axis.
    #[error("degenerate domain: {0}")]
    DegenerateDomain(String),

    /// The cell size does not fit at least once in a mesh block dimension.
    #[error(
        "cell size {cell_size} m is larger than the mesh block {axis} dimension {block_size:.3} m"
    )]
    CellSizeTooCoarse {
        axis: char,
        cell_size: f64,
        block_size: f64,
    },

    /// The DEM sampling grid is too small to build a terrain.
    #[error("too few sampling points ({count}) along {axis} axis, at least 3 required")]
    TooFewSamples { axis: char, count: usize },

    /// Every sampled DEM value is `NoData`.
    #[error("DEM has no valid elevation over the {0} sampled points")]
    EmptyDem(usize),

    /// A coordinate transformation failed or is undefined.
    #[error("reprojection from {from} to {to} failed: {reason}")]
    Reprojection {
        from: String,
        to: String,
        reason: String,
    },

    /// The terrain mesh cannot be encoded or decoded as bingeom.
    #[error("bingeom serialization failed: {0}")]
    Serialization(String),

    /// Reading or writing a file failed.
    #[error("I/O error on <{}>: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The wind file could not be read at all.
    #[error("wind file <{}> not readable: {source}", path.display())]
    WindFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The progress sink requested cancellation between two stages.
    #[error("export cancelled before stage <{0}>")]
    Cancelled(&'static str),
}

impl ExportError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by configuration values rather than data or I/O.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig(_)
                | Self::InvalidDomainConfig(_)
                | Self::DegenerateDomain(_)
                | Self::CellSizeTooCoarse { .. }
                | Self::TooFewSamples { .. }
        )
    }
}

/// Recoverable error for a single malformed wind CSV row.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("row {line}: {reason} <{raw}>")]
pub struct WindRowError {
    /// 1-based line number in the file, header included.
    pub line: usize,
    /// Row text as read.
    pub raw: String,
    /// What was wrong with it.
    pub reason: String,
}

/// Convenience type alias for results using [`ExportError`].
pub type Result<T> = std::result::Result<T, ExportError>;
