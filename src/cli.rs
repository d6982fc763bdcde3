//! Command-line definitions for dbv.
//!
//! Kept free of crate-internal imports: the build script includes this file
//! directly to render the man page.

use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// Compression format for data files
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Gzip compression (.gz) - Most common, good balance of speed and compression
    Gzip,
    /// Zstandard compression (.zst) - Modern, fast compression with good ratios
    Zstd,
    /// Bzip2 compression (.bz2) - Good compression ratio, slower than gzip
    Bzip2,
    /// XZ compression (.xz) - Excellent compression ratio, slower than bzip2
    Xz,
}

impl CompressionFormat {
    /// Detect compression format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            match ext.to_lowercase().as_str() {
                "gz" => Some(Self::Gzip),
                "zst" | "zstd" => Some(Self::Zstd),
                "bz2" | "bz" => Some(Self::Bzip2),
                "xz" => Some(Self::Xz),
                _ => None,
            }
        } else {
            None
        }
    }

    /// Parse the config-file spelling of a compression format
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "gzip" | "gz" => Some(Self::Gzip),
            "zstd" | "zst" => Some(Self::Zstd),
            "bzip2" | "bz2" => Some(Self::Bzip2),
            "xz" => Some(Self::Xz),
            _ => None,
        }
    }

    /// Get file extension for this compression format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Zstd => "zst",
            Self::Bzip2 => "bz2",
            Self::Xz => "xz",
        }
    }
}

/// Which engine evaluates filter text typed at the `/` prompt
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum EvaluatorKind {
    /// SQL expression syntax over the loaded columns (trusted, local use)
    Sql,
    /// Restricted grammar: comparisons, arithmetic, and/or/not, aggregates
    Safe,
}

impl EvaluatorKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "sql" => Some(Self::Sql),
            "safe" => Some(Self::Safe),
            _ => None,
        }
    }
}

/// Command-line arguments for dbv
#[derive(Clone, Parser, Debug)]
#[command(name = "dbv", version, about = "Database Viewer: browse tables in the terminal")]
pub struct Args {
    /// Path(s) to the data file(s) to open.
    /// Multiple files of the same format are concatenated into one table
    #[arg(required_unless_present_any = ["generate_config", "clear_cache"], num_args = 1.., value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Skip this many lines when reading a file
    #[arg(long = "skip-lines")]
    pub skip_lines: Option<usize>,

    /// Skip this many rows when reading a file
    #[arg(long = "skip-rows")]
    pub skip_rows: Option<usize>,

    /// Specify that the file has no header
    #[arg(long = "no-header")]
    pub no_header: Option<bool>,

    /// Specify the delimiter to use when reading a file
    #[arg(long = "delimiter")]
    pub delimiter: Option<u8>,

    /// Specify the compression format explicitly (gzip, zstd, bzip2, xz)
    /// If not specified, compression is auto-detected from file extension.
    #[arg(long = "compression", value_enum)]
    pub compression: Option<CompressionFormat>,

    /// Start with this filter applied
    #[arg(long = "filter", value_name = "TEXT")]
    pub filter: Option<String>,

    /// Filter expression evaluator (overrides the config file)
    #[arg(long = "evaluator", value_enum)]
    pub evaluator: Option<EvaluatorKind>,

    /// Enable debug mode to show operational information
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Clear all cache data (logs) and exit
    #[arg(long = "clear-cache", action)]
    pub clear_cache: bool,

    /// Write the default configuration file and exit
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}
