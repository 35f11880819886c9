use fxhash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use super::error::{DecodeError, MetadataError, TableError};
use super::frame::FrameDecoder;
use super::header::{HeaderLine, HeaderParser};
use super::instrument::{CastRecord, VoltageCalibration};
use super::rules::RULE_TABLE;
use super::table::DataTable;

/// Everything recovered from a single HEX file
#[derive(Debug, Clone, Default)]
pub struct DecodeResult {
    pub table: DataTable,
    pub casts: Vec<CastRecord>,
    pub voltage_offsets: FxHashMap<String, VoltageCalibration>,
    pub pump_delay_seconds: f64,
    pub serial_number: Option<String>,
}

/// Layout of the YAML sidecar file
#[derive(Debug, Serialize)]
struct DecodeMetadata<'a> {
    serial_number: Option<&'a str>,
    pump_delay_seconds: f64,
    n_rows: usize,
    columns: Vec<&'a str>,
    casts: &'a [CastRecord],
    voltage_offsets: BTreeMap<&'a str, VoltageCalibration>,
}

impl DecodeResult {
    /// True when the file had no data section. This is distinct from a decoded table with
    /// a known schema.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The rows of the table belonging to a cast, if the cast exists
    pub fn cast_table(&self, cast_number: i64) -> Option<DataTable> {
        let cast = self.casts.iter().find(|c| c.cast_number == cast_number)?;
        Some(self.table.slice_rows(cast.row_range(self.table.n_rows())))
    }

    /// Write the non-tabular results to a yaml file
    pub fn write_metadata(&self, path: &Path) -> Result<(), MetadataError> {
        let metadata = DecodeMetadata {
            serial_number: self.serial_number.as_deref(),
            pump_delay_seconds: self.pump_delay_seconds,
            n_rows: self.table.n_rows(),
            columns: self.table.names(),
            casts: &self.casts,
            voltage_offsets: self
                .voltage_offsets
                .iter()
                .map(|(k, v)| (k.as_str(), *v))
                .collect(),
        };
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&metadata)?.as_bytes())?;
        Ok(())
    }
}

/// Decode a HEX file at path
pub fn decode_file(path: &Path) -> Result<DecodeResult, DecodeError> {
    if !path.exists() {
        return Err(DecodeError::BadFilePath(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|e| DecodeError::IOError { line: 0, source: e })?;
    let size = file
        .metadata()
        .map_err(|e| DecodeError::IOError { line: 0, source: e })?
        .len();
    spdlog::info!(
        "Decoding {} ({})",
        path.to_string_lossy(),
        human_bytes::human_bytes(size as f64)
    );
    decode_reader(BufReader::new(file))
}

/// Decode HEX data from any line-oriented reader.
///
/// Header lines configure the instrument until the end-of-header marker; every line after it
/// is a data line. Bad header lines and bad fields are logged and skipped. Only a failure of
/// the reader itself stops the decode.
pub fn decode_reader<R: BufRead>(reader: R) -> Result<DecodeResult, DecodeError> {
    let mut header = HeaderParser::new();
    let mut frames: Option<FrameDecoder> = None;

    let mut reader = reader;
    let mut buffer: Vec<u8> = Vec::new();
    let mut line_number = 0;
    loop {
        buffer.clear();
        let n_bytes = reader
            .read_until(b'\n', &mut buffer)
            .map_err(|e| DecodeError::IOError {
                line: line_number + 1,
                source: e,
            })?;
        if n_bytes == 0 {
            break;
        }
        line_number += 1;
        // Free-text header notes are not always UTF-8
        let line = String::from_utf8_lossy(&buffer);
        let line = line.trim_end_matches(['\n', '\r']);

        if let Some(decoder) = frames.as_mut() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            for e in decoder.decode_line(line) {
                spdlog::warn!("Skipped field on line {line_number}: {e}");
            }
            continue;
        }

        match header.parse_line(line) {
            Ok(HeaderLine::EndOfHeader) => {
                spdlog::debug!("End of header at line {line_number}");
                let parser = std::mem::take(&mut header);
                frames = Some(FrameDecoder::new(RULE_TABLE, parser.into_config()));
            }
            Ok(HeaderLine::Ignored) => (),
            Ok(kind) => spdlog::debug!("Header line {line_number}: {kind:?}"),
            Err(e) => spdlog::warn!("Skipped header line {line_number}: {e}"),
        }
    }

    let decoder = match frames {
        Some(d) => d,
        None => {
            spdlog::warn!("No end-of-header marker found; the file has no data section");
            let config = header.into_config();
            return Ok(DecodeResult {
                table: DataTable::empty(),
                casts: config.casts,
                voltage_offsets: config.voltage_offsets,
                pump_delay_seconds: config.pump_delay_seconds,
                serial_number: config.serial_number,
            });
        }
    };

    let (columns, config, rows) = decoder.finish();
    if rows != config.sample_count {
        spdlog::warn!(
            "Header reported {} samples but {} data lines were decoded",
            config.sample_count,
            rows
        );
    }
    let table = match columns.assemble(rows) {
        Ok(table) => table,
        Err(TableError::EmptySchema) => {
            spdlog::warn!("Data section produced no columns");
            DataTable::empty()
        }
        Err(e) => {
            spdlog::error!("Failed to assemble table: {e}");
            DataTable::empty()
        }
    };
    spdlog::info!(
        "Decoded {} rows with {} columns",
        table.n_rows(),
        table.n_columns()
    );

    Ok(DecodeResult {
        table,
        casts: config.casts,
        voltage_offsets: config.voltage_offsets,
        pump_delay_seconds: config.pump_delay_seconds,
        serial_number: config.serial_number,
    })
}
