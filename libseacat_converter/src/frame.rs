use super::error::FrameError;
use super::instrument::InstrumentConfig;
use super::rules::ChannelDecodeRule;
use super::table::ColumnAccumulator;

/// Interpret a field of hex digits as an unsigned integer.
///
/// Only ASCII hex digits are accepted; `from_str_radix` would otherwise allow a sign.
pub fn parse_hex_field(field: &str, position: usize) -> Result<f64, FrameError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(FrameError::InvalidHex(field.to_string(), position));
    }
    let value = u64::from_str_radix(field, 16)
        .map_err(|_| FrameError::InvalidHex(field.to_string(), position))?;
    Ok(value as f64)
}

/// FrameDecoder turns data lines into column values.
///
/// The set of rules applied to every row is fixed by the first data line: a rule that is
/// excluded by the configuration, or that does not fit in that first line, never produces
/// a column. The schema is captured once and never changes afterwards.
#[derive(Debug)]
pub struct FrameDecoder {
    rules: &'static [ChannelDecodeRule],
    config: InstrumentConfig,
    schema: Option<Vec<usize>>,
    row: usize,
    columns: ColumnAccumulator,
}

impl FrameDecoder {
    /// Create a decoder for the given rule table. The configuration is frozen from here on.
    pub fn new(rules: &'static [ChannelDecodeRule], config: InstrumentConfig) -> Self {
        let columns = ColumnAccumulator::new(config.sample_count);
        Self {
            rules,
            config,
            schema: None,
            row: 0,
            columns,
        }
    }

    pub fn config(&self) -> &InstrumentConfig {
        &self.config
    }

    /// Number of rows decoded so far
    pub fn rows(&self) -> usize {
        self.row
    }

    /// Decode one data line into the current row, then move to the next row.
    ///
    /// Returns the per-field errors encountered. None of them stop the row; the offending
    /// field is skipped and the offset is not advanced.
    pub fn decode_line(&mut self, line: &str) -> Vec<FrameError> {
        let errors = match self.schema.take() {
            Some(schema) => {
                let errors = self.decode_scheduled(line, &schema);
                self.schema = Some(schema);
                errors
            }
            None => self.discover_schema(line),
        };
        self.row += 1;
        errors
    }

    /// Walk every rule for the first row, recording those which produce a value
    fn discover_schema(&mut self, line: &str) -> Vec<FrameError> {
        let mut schema = Vec::new();
        let mut errors = Vec::new();
        let mut offset = 0;
        for (idx, rule) in self.rules.iter().enumerate() {
            if rule.is_skipped(&self.config) {
                continue;
            }
            match read_field(line, offset, rule) {
                Ok(Some(value)) => {
                    let column = self.columns.register(rule.column_name);
                    self.columns.write(column, self.row, value);
                    schema.push(idx);
                    offset += rule.hex_width;
                }
                Ok(None) => (),
                Err(e) => errors.push(e),
            }
        }
        spdlog::debug!(
            "Discovered {} columns on the first data line: {:?}",
            schema.len(),
            self.columns.names()
        );
        self.schema = Some(schema);
        errors
    }

    /// Apply only the rules captured in the schema. Column indices follow schema order.
    fn decode_scheduled(&mut self, line: &str, schema: &[usize]) -> Vec<FrameError> {
        let mut errors = Vec::new();
        let mut offset = 0;
        for (column, idx) in schema.iter().enumerate() {
            let rule = &self.rules[*idx];
            match read_field(line, offset, rule) {
                Ok(Some(value)) => {
                    self.columns.write(column, self.row, value);
                    offset += rule.hex_width;
                }
                Ok(None) => (),
                Err(e) => errors.push(e),
            }
        }
        errors
    }

    /// Hand over the accumulated columns and the configuration
    pub fn finish(self) -> (ColumnAccumulator, InstrumentConfig, usize) {
        (self.columns, self.config, self.row)
    }
}

/// Read and scale the field for a rule starting at offset.
///
/// Returns None if the line is too short for the field.
fn read_field(
    line: &str,
    offset: usize,
    rule: &ChannelDecodeRule,
) -> Result<Option<f64>, FrameError> {
    if line.len() < offset + rule.hex_width {
        return Ok(None);
    }
    let field = line
        .get(offset..offset + rule.hex_width)
        .ok_or_else(|| FrameError::InvalidHex(String::from("<non-ascii>"), offset))?;
    let raw = parse_hex_field(field, offset)?;
    Ok(Some(rule.scale(raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{RULE_TABLE, TIME_COLUMN};

    fn profile_config(volts: &[usize]) -> InstrumentConfig {
        let mut config = InstrumentConfig {
            mode: String::from("profile"),
            sample_count: 3,
            ..Default::default()
        };
        for name in ["SBE38", "WETLABS", "OPTODE", "SBE63", "GasTensionDevice"] {
            config.extra_sensor_flags.insert(name.to_string(), false);
        }
        for v in 0..6 {
            config
                .voltage_channel_flags
                .insert(format!("External Voltage {v}"), volts.contains(&v));
        }
        config
    }

    #[test]
    fn test_parse_hex_field() {
        assert_eq!(parse_hex_field("0A1B2C", 0), Ok(662_316.0));
        assert_eq!(parse_hex_field("abc", 0), Ok(2748.0));
        assert!(parse_hex_field("+12", 0).is_err());
        assert!(parse_hex_field("12G4", 4).is_err());
        assert!(parse_hex_field("", 0).is_err());
        // wider than a u64
        assert_eq!(
            parse_hex_field("1FFFFFFFFFFFFFFFF", 8),
            Err(FrameError::InvalidHex(String::from("1FFFFFFFFFFFFFFFF"), 8))
        );
    }

    #[test]
    fn test_raw_counts_roundtrip() {
        let mut decoder = FrameDecoder::new(RULE_TABLE, profile_config(&[]));
        let errors = decoder.decode_line("0A1B2C0C0000012345FFFF");
        assert!(errors.is_empty());
        let (columns, _, rows) = decoder.finish();
        let table = match columns.assemble(rows) {
            Ok(t) => t,
            Err(_) => panic!(),
        };
        assert_eq!(table.n_columns(), 4);
        assert_eq!(table.column("Temperature A/D Counts").unwrap()[0], 662_316.0);
        assert_eq!(table.column("Pressure A/D Counts").unwrap()[0], 74_565.0);
        assert_eq!(table.column("Conductivity Frequency").unwrap()[0], 3072.0);
        assert!(
            (table.column("Pressure Temperature Compensation Voltage").unwrap()[0]
                - 65535.0 / 13107.0)
                .abs()
                < 1e-12
        );
    }

    #[test]
    fn test_absent_voltage_shifts_offset() {
        // volt 0 absent, volt 1 present: the 4 characters after the main block belong to volt 1
        let line = "0000010000020000030001FFFF";
        let mut decoder = FrameDecoder::new(RULE_TABLE, profile_config(&[1]));
        assert!(decoder.decode_line(line).is_empty());
        let (columns, _, rows) = decoder.finish();
        let table = columns.assemble(rows).unwrap();
        assert_eq!(
            table.names(),
            vec![
                "Temperature A/D Counts",
                "Conductivity Frequency",
                "Pressure A/D Counts",
                "Pressure Temperature Compensation Voltage",
                "External Voltage 1",
            ]
        );
        assert!(table.column("External Voltage 0").is_none());
        assert!((table.column("External Voltage 1").unwrap()[0] - 65535.0 / 13107.0).abs() < 1e-12);
    }

    #[test]
    fn test_profile_mode_has_no_clock() {
        // plenty of trailing characters, which would fit a clock field
        let line = "000001000002000003000100020003000400050006AABBCCDD";
        let mut decoder = FrameDecoder::new(RULE_TABLE, profile_config(&[0, 1, 2, 3, 4, 5]));
        decoder.decode_line(line);
        decoder.decode_line(line);
        let (columns, _, rows) = decoder.finish();
        let table = columns.assemble(rows).unwrap();
        assert!(table.column(TIME_COLUMN).is_none());
        assert_eq!(table.n_columns(), 10);
        assert_eq!(table.n_rows(), 2);
    }

    #[test]
    fn test_clock_outside_profile_mode() {
        let mut config = profile_config(&[]);
        config.mode = String::from("moored");
        let mut decoder = FrameDecoder::new(RULE_TABLE, config);
        decoder.decode_line("0000010000020000030001000003E8");
        let (columns, _, rows) = decoder.finish();
        let table = columns.assemble(rows).unwrap();
        assert_eq!(table.column(TIME_COLUMN).unwrap()[0], 1000.0);
    }

    #[test]
    fn test_schema_fixed_by_first_row() {
        let mut decoder = FrameDecoder::new(RULE_TABLE, profile_config(&[0]));
        // first row too short for volt 0
        decoder.decode_line("000001000002000003000A");
        // later rows carry it, but the schema is already fixed
        decoder.decode_line("000001000002000003000A0001");
        decoder.decode_line("000001000002000003000A0001");
        let (columns, _, rows) = decoder.finish();
        let table = columns.assemble(rows).unwrap();
        assert!(table.column("External Voltage 0").is_none());
        assert_eq!(table.n_columns(), 4);
        assert_eq!(table.n_rows(), 3);
    }

    #[test]
    fn test_short_line_skips_only_missing_fields() {
        let mut decoder = FrameDecoder::new(RULE_TABLE, profile_config(&[0]));
        decoder.decode_line("0000010000020000030001FFFF");
        // second row is missing the voltage field
        let errors = decoder.decode_line("0000050000060000070002");
        assert!(errors.is_empty());
        decoder.decode_line("0000010000020000030001FFFF");
        let (columns, _, rows) = decoder.finish();
        let table = columns.assemble(rows).unwrap();
        let temperature = table.column("Temperature A/D Counts").unwrap();
        assert_eq!(temperature.to_vec(), vec![1.0, 5.0, 1.0]);
        let volt = table.column("External Voltage 0").unwrap();
        assert!(volt[1].is_nan());
        assert!((volt[2] - 65535.0 / 13107.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_hex_skips_field() {
        let mut decoder = FrameDecoder::new(RULE_TABLE, profile_config(&[]));
        decoder.decode_line("0000010000020000030001");
        // the bad field stalls the offset, so the 6 wide fields after it fail too
        let errors = decoder.decode_line("00000Z0000020000030001");
        assert_eq!(errors.len(), 3);
        let (columns, _, rows) = decoder.finish();
        let table = columns.assemble(rows).unwrap();
        assert_eq!(table.n_rows(), 2);
        assert!(table.column("Temperature A/D Counts").unwrap()[1].is_nan());
        assert_eq!(
            table.column("Pressure Temperature Compensation Voltage").unwrap()[1],
            0.0
        );
    }
}
