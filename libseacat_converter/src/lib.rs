//! # seacat_converter
//!
//! seacat_converter reads raw HEX uploads from Sea-Bird SBE 19plus V2 profilers and turns them
//! into a columnar table of named channels, then derives further quantities (currently
//! dissolved oxygen from an SBE 43) using the manufacturer calibration equations.
//!
//! ## Decoding
//!
//! A HEX upload is a block of `*` header lines describing the instrument, a `*END*` marker,
//! and then one line of packed hex digits per sample. The header says which optional sensors
//! and external voltage channels are installed, which decides which fields are present in
//! each data line. The decoder makes a single pass over the file:
//!
//! - [header::HeaderParser] builds an [instrument::InstrumentConfig] from the header lines
//! - [frame::FrameDecoder] walks [rules::RULE_TABLE] over each data line. The columns of the
//!   output are fixed by what the *first* data line contains.
//! - [table::ColumnAccumulator] assembles the columns into a [table::DataTable]
//!
//! ```no_run
//! use std::path::Path;
//! use libseacat_converter::decoder::decode_file;
//!
//! let result = decode_file(Path::new("cast.hex")).unwrap();
//! if result.is_empty() {
//!     println!("No data section found");
//! }
//! for name in result.table.names() {
//!     println!("{name}");
//! }
//! ```
//!
//! Malformed header lines and bad hex fields are logged and skipped; they never stop a
//! decode. A file with no `*END*` marker decodes to an empty table.
//!
//! ## Configuration
//!
//! Calibration coefficients for derived quantities are read from a YAML file:
//!
//! ```yml
//! oxygen:
//!   voltage_column: External Voltage 0
//!   coefficients:
//!     soc: 0.4664
//!     offset: -0.5153
//!     tau20: 1.49
//!     a: -0.0039628
//!     b: 0.0001806
//!     c: -2.3781e-6
//!     e: 0.036
//!     d1: 0.000192634
//!     d2: -0.0464803
//! ```
//!
//! The oxygen equation needs `Salinity (psu)`, `Temperature (degC)` and `Pressure (dbars)`
//! columns in addition to the voltage, so it is applied to a table which already carries
//! those engineering units.
//!
//! ## Output
//!
//! Besides the table, a decode yields the casts recorded by the instrument, the external
//! voltage calibrations and the pump delay. These can be written next to the data as a
//! YAML file with [decoder::DecodeResult::write_metadata].
//!
//! ## Logging
//!
//! The library logs through spdlog-rs. Applications choose the sinks.
pub mod config;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod header;
pub mod instrument;
pub mod oxygen;
pub mod rules;
pub mod table;
