use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum HeaderError {
    #[error("Header line has {0} segments; expected {1}")]
    SegmentCount(usize, usize),
    #[error("Header line is missing the field {0}")]
    MissingField(&'static str),
    #[error("Header line has an invalid number for {0}: {1:?}")]
    BadNumber(&'static str, String),
    #[error("Header line has an invalid date/time: {0:?}")]
    BadDateTime(String),
    #[error("Cast {0} starts at sample {1}, after its end sample {2}")]
    CastOrder(i64, usize, usize),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameError {
    #[error("Invalid hex field {0:?} at character {1}")]
    InvalidHex(String, usize),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TableError {
    #[error("No rows were decoded; the table has no schema")]
    EmptySchema,
    #[error("Table already has a column named {0:?}")]
    DuplicateColumn(String),
    #[error("Column {name:?} has {given} rows; the table has {expected}")]
    LengthMismatch {
        name: String,
        given: usize,
        expected: usize,
    },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Could not decode because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Decoder failed due to IO error at line {line}: {source}")]
    IOError {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Metadata failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Metadata failed to convert to yaml: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum OxygenError {
    #[error("Oxygen equation requires the column {0:?}, which the table does not have")]
    MissingColumn(String),
    #[error("Oxygen equation failed due to table error: {0}")]
    Table(#[from] TableError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Config failed to derive quantities: {0}")]
    DeriveError(#[from] OxygenError),
}
