use super::constants::*;
use super::error::HeaderError;
use super::instrument::{
    parse_instrument_datetime, CastRecord, HeaderTimestamp, InstrumentConfig, VoltageCalibration,
};

/// What the header parser made of a single line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLine {
    Banner,
    Samples,
    Mode,
    PressureSensor,
    ExtraSensors,
    VoltageFlags,
    VoltageOffset,
    Cast,
    EndOfHeader,
    Ignored,
}

/// HeaderParser owns the InstrumentConfig while the header is being read.
///
/// Lines are fed one at a time. Once the end-of-header marker is seen the parser is
/// finished and the config is handed over with [HeaderParser::into_config].
#[derive(Debug, Default)]
pub struct HeaderParser {
    config: InstrumentConfig,
    finished: bool,
}

impl HeaderParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn config(&self) -> &InstrumentConfig {
        &self.config
    }

    pub fn into_config(self) -> InstrumentConfig {
        self.config
    }

    /// Parse a header line, updating the configuration.
    ///
    /// Unrecognized lines are ignored. A recognized line with a bad structure returns an
    /// error and leaves the configuration as it was before the line.
    pub fn parse_line(&mut self, line: &str) -> Result<HeaderLine, HeaderError> {
        if self.finished {
            return Ok(HeaderLine::Ignored);
        }
        let line = line.trim_end();
        let cfg = &mut self.config;
        if line.starts_with(END_OF_HEADER) {
            self.finished = true;
            Ok(HeaderLine::EndOfHeader)
        } else if line.starts_with(EXPECTED_SIGNATURE) {
            if cfg.serial_number.is_none() {
                parse_banner(cfg, line)?;
            }
            Ok(HeaderLine::Banner)
        } else if line.starts_with(BANNER_PREFIX) {
            spdlog::warn!("Unexpected instrument signature, ignoring banner: {line}");
            Ok(HeaderLine::Ignored)
        } else if line.starts_with(SAMPLES_PREFIX) {
            cfg.sample_count = parse_samples(line)?;
            Ok(HeaderLine::Samples)
        } else if line.starts_with(MODE_PREFIX) {
            let (mode, delay) = parse_mode(line)?;
            cfg.mode = mode;
            cfg.pump_delay_seconds = delay;
            Ok(HeaderLine::Mode)
        } else if line.starts_with(PRESSURE_SENSOR_PREFIX) {
            for (key, value) in parse_pairs(line)? {
                cfg.pressure_sensor_info.insert(key, value);
            }
            Ok(HeaderLine::PressureSensor)
        } else if line.starts_with(EXTRA_SENSOR_PREFIX) {
            for (key, value) in parse_pairs(line)? {
                let key: String = key.chars().filter(|c| !c.is_whitespace()).collect();
                cfg.extra_sensor_flags.insert(key, is_yes(&value));
            }
            Ok(HeaderLine::ExtraSensors)
        } else if line.starts_with(EXT_VOLT_PREFIX) {
            for (key, value) in parse_pairs(line)? {
                let key = key.replace("Ext", "External").replace("Volt", "Voltage");
                cfg.voltage_channel_flags.insert(key, is_yes(&value));
            }
            Ok(HeaderLine::VoltageFlags)
        } else if line.starts_with(VOLT_OFFSET_PREFIX) && line.contains(VOLT_OFFSET_MARKER) {
            let (key, calibration) = parse_voltage_offset(line)?;
            cfg.voltage_offsets.insert(key, calibration);
            Ok(HeaderLine::VoltageOffset)
        } else if line.starts_with(CAST_PREFIX) {
            cfg.casts.push(parse_cast(line)?);
            Ok(HeaderLine::Cast)
        } else {
            Ok(HeaderLine::Ignored)
        }
    }
}

/// Remove the leading comment marker of a header line
fn strip_marker(line: &str) -> &str {
    line.trim_start_matches('*').trim()
}

fn is_yes(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("yes")
}

/// Split a `key = value` segment on the first `=`
fn split_pair(segment: &str) -> Option<(String, String)> {
    let (key, value) = segment.split_once('=')?;
    Some((key.trim().to_string(), value.trim().to_string()))
}

/// Parse every comma separated `key = value` pair on a line.
///
/// Trailing empty segments (lines commonly end with a comma) are dropped.
fn parse_pairs(line: &str) -> Result<Vec<(String, String)>, HeaderError> {
    strip_marker(line)
        .split(',')
        .filter(|segment| !segment.trim().is_empty())
        .map(|segment| split_pair(segment).ok_or(HeaderError::MissingField("=")))
        .collect()
}

/// Parse the leading number of a value such as `60 sec`
fn leading_number(field: &'static str, value: &str) -> Result<f64, HeaderError> {
    value
        .split_whitespace()
        .next()
        .and_then(|token| token.parse::<f64>().ok())
        .ok_or_else(|| HeaderError::BadNumber(field, value.to_string()))
}

fn parse_usize(field: &'static str, value: &str) -> Result<usize, HeaderError> {
    value
        .trim()
        .parse()
        .map_err(|_| HeaderError::BadNumber(field, value.to_string()))
}

fn parse_banner(cfg: &mut InstrumentConfig, line: &str) -> Result<(), HeaderError> {
    let (_, rest) = line
        .split_once(SERIAL_MARKER)
        .ok_or(HeaderError::MissingField("serial number"))?;
    let mut tokens = rest.split_whitespace();
    let serial = tokens
        .next()
        .ok_or(HeaderError::MissingField("serial number"))?;
    let date_text = tokens.collect::<Vec<&str>>().join(" ");
    cfg.serial_number = Some(serial.to_string());
    cfg.end_date_time = match parse_instrument_datetime(&date_text) {
        Ok(dt) => Some(HeaderTimestamp::Parsed(dt)),
        Err(_) if date_text.is_empty() => None,
        Err(_) => Some(HeaderTimestamp::Raw(date_text)),
    };
    Ok(())
}

fn parse_samples(line: &str) -> Result<usize, HeaderError> {
    let segment = strip_marker(line)
        .split(',')
        .next()
        .ok_or(HeaderError::MissingField("samples"))?;
    let (_, value) = split_pair(segment).ok_or(HeaderError::MissingField("samples"))?;
    parse_usize("samples", &value)
}

fn parse_mode(line: &str) -> Result<(String, f64), HeaderError> {
    let segments: Vec<&str> = strip_marker(line).split(',').collect();
    if segments.len() != MODE_SEGMENTS {
        return Err(HeaderError::SegmentCount(segments.len(), MODE_SEGMENTS));
    }
    let (_, mode) = split_pair(segments[0]).ok_or(HeaderError::MissingField("mode"))?;
    let (_, delay) = split_pair(segments[2]).ok_or(HeaderError::MissingField("pump delay"))?;
    Ok((mode, leading_number("pump delay", &delay)?))
}

/// `* volt 0: offset = -4.650526e-02, slope = 1.216381e+00`
fn parse_voltage_offset(line: &str) -> Result<(String, VoltageCalibration), HeaderError> {
    let body = line
        .strip_prefix(VOLT_OFFSET_PREFIX)
        .ok_or(HeaderError::MissingField("volt"))?;
    let (label, values) = body
        .split_once(':')
        .ok_or(HeaderError::MissingField(":"))?;
    let segments: Vec<&str> = values.split(',').collect();
    if segments.len() != 2 {
        return Err(HeaderError::SegmentCount(segments.len(), 2));
    }
    let (_, offset) = split_pair(segments[0]).ok_or(HeaderError::MissingField("offset"))?;
    let (_, slope) = split_pair(segments[1]).ok_or(HeaderError::MissingField("slope"))?;
    let calibration = VoltageCalibration {
        offset: leading_number("offset", &offset)?,
        slope: leading_number("slope", &slope)?,
    };
    Ok((format!("External Voltage {}", label.trim()), calibration))
}

/// `* cast   1 01 Mar 2018 13:54:14 samples 1 to 2234, avg = 1, stop = mag switch`
fn parse_cast(line: &str) -> Result<CastRecord, HeaderError> {
    let segments: Vec<&str> = strip_marker(line).split(',').collect();
    if segments.len() < 2 {
        return Err(HeaderError::SegmentCount(segments.len(), 2));
    }
    let tokens: Vec<&str> = segments[0].split_whitespace().collect();
    // cast N DD Mon YYYY HH:MM:SS samples S to E
    if tokens.len() != 10 {
        return Err(HeaderError::SegmentCount(tokens.len(), 10));
    }
    let cast_number: i64 = tokens[1]
        .parse()
        .map_err(|_| HeaderError::BadNumber("cast", tokens[1].to_string()))?;
    let start_time = parse_instrument_datetime(&tokens[2..6].join(" "))?;
    let start_sample = parse_usize("start sample", tokens[7])?;
    let end_sample = parse_usize("end sample", tokens[9])?;
    if start_sample > end_sample {
        return Err(HeaderError::CastOrder(cast_number, start_sample, end_sample));
    }
    let (_, avg) = split_pair(segments[1]).ok_or(HeaderError::MissingField("avg"))?;
    Ok(CastRecord {
        cast_number,
        start_time,
        start_sample,
        end_sample,
        average_count: parse_usize("avg", &avg)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn parse_all(lines: &[&str]) -> HeaderParser {
        let mut parser = HeaderParser::new();
        for line in lines {
            let _ = parser.parse_line(line);
        }
        parser
    }

    #[test]
    fn test_banner() {
        let parser = parse_all(&[
            "* Sea-Bird SBE19plus  V 2.5.2  SERIAL NO. 4216    01 Mar 2018  14:36:53",
            "* Sea-Bird SBE19plus  V 2.5.2  SERIAL NO. 9999    02 Mar 2018  14:36:53",
        ]);
        let cfg = parser.config();
        assert_eq!(cfg.serial_number.as_deref(), Some("4216"));
        assert_eq!(
            cfg.end_date_time,
            Some(HeaderTimestamp::Parsed(datetime!(2018-03-01 14:36:53 UTC)))
        );
    }

    #[test]
    fn test_banner_raw_date() {
        let parser = parse_all(&["* Sea-Bird SBE19plus  V 2.5.2  SERIAL NO. 4216  unknown"]);
        assert_eq!(
            parser.config().end_date_time,
            Some(HeaderTimestamp::Raw(String::from("unknown")))
        );
    }

    #[test]
    fn test_samples_and_mode() {
        let parser = parse_all(&[
            "* samples = 2234, free = 1812586, casts = 1",
            "* mode = profile, minimum cond freq = 3000, pump delay = 60 sec",
        ]);
        let cfg = parser.config();
        assert_eq!(cfg.sample_count, 2234);
        assert_eq!(cfg.mode, "profile");
        assert_eq!(cfg.pump_delay_seconds, 60.0);
    }

    #[test]
    fn test_mode_wrong_segments() {
        let mut parser = HeaderParser::new();
        let result = parser.parse_line("* mode = moored, sample interval = 10 sec");
        assert_eq!(result, Err(HeaderError::SegmentCount(2, 3)));
        assert_eq!(parser.config().mode, "");
        assert_eq!(
            parser.parse_line("* samples = 12, free = 1"),
            Ok(HeaderLine::Samples)
        );
    }

    #[test]
    fn test_sensor_flags() {
        let parser = parse_all(&[
            "* pressure sensor = strain gauge, range = 508.0",
            "* SBE 38 = no, WETLABS = no, OPTODE = yes, SBE63 = no, Gas Tension Device = no",
            "* Ext Volt 0 = yes, Ext Volt 1 = no",
            "* Ext Volt 2 = yes, Ext Volt 3 = no",
        ]);
        let cfg = parser.config();
        assert_eq!(cfg.pressure_sensor_info["pressure sensor"], "strain gauge");
        assert_eq!(cfg.pressure_sensor_info["range"], "508.0");
        assert_eq!(cfg.extra_sensor_flags.get("SBE38"), Some(&false));
        assert_eq!(cfg.extra_sensor_flags.get("OPTODE"), Some(&true));
        assert_eq!(cfg.extra_sensor_flags.get("GasTensionDevice"), Some(&false));
        assert_eq!(cfg.voltage_channel_flags.get("External Voltage 0"), Some(&true));
        assert_eq!(cfg.voltage_channel_flags.get("External Voltage 1"), Some(&false));
        assert_eq!(cfg.voltage_channel_flags.get("External Voltage 2"), Some(&true));
        assert_eq!(cfg.voltage_channel_flags.get("External Voltage 4"), None);
    }

    #[test]
    fn test_voltage_offsets() {
        let parser = parse_all(&[
            "* volt 0: offset = -4.650526e-02, slope = 1.216381e+00",
            "* volt 1: offset = -4.618105e-02, slope = 1.215275e+00",
        ]);
        let cfg = parser.config();
        let v0 = cfg.voltage_offsets["External Voltage 0"];
        assert_eq!(v0.offset, -4.650526e-02);
        assert_eq!(v0.slope, 1.216381e+00);
        assert!(cfg.voltage_offsets.contains_key("External Voltage 1"));
    }

    #[test]
    fn test_casts_in_order() {
        let parser = parse_all(&[
            "* cast   1 01 Mar 2018 13:54:14 samples 1 to 2234, avg = 1, stop = mag switch",
            "* cast   2 01 Mar 2018 15:10:02 samples 2235 to 4000, avg = 2, stop = mag switch",
        ]);
        let casts = &parser.config().casts;
        assert_eq!(casts.len(), 2);
        assert_eq!(casts[0].cast_number, 1);
        assert_eq!(casts[0].start_time, datetime!(2018-03-01 13:54:14 UTC));
        assert_eq!(casts[1].cast_number, 2);
        assert_eq!(casts[1].average_count, 2);
        for cast in casts {
            assert!(cast.start_sample <= cast.end_sample);
        }
    }

    #[test]
    fn test_malformed_cast_skipped() {
        let mut parser = HeaderParser::new();
        assert!(parser
            .parse_line("* cast   1 01 Mar 2018 13:54:14 samples 1 to 2234")
            .is_err());
        assert!(parser
            .parse_line("* cast   1 01 Foo 2018 13:54:14 samples 1 to 2234, avg = 1")
            .is_err());
        assert_eq!(
            parser.parse_line("* cast   3 01 Mar 2018 13:54:14 samples 90 to 10, avg = 1"),
            Err(HeaderError::CastOrder(3, 90, 10))
        );
        assert!(parser.config().casts.is_empty());
    }

    #[test]
    fn test_end_of_header_is_final() {
        let mut parser = HeaderParser::new();
        assert_eq!(parser.parse_line("* status = not logging"), Ok(HeaderLine::Ignored));
        assert_eq!(parser.parse_line("*END*"), Ok(HeaderLine::EndOfHeader));
        assert!(parser.is_finished());
        assert_eq!(parser.parse_line("*END*"), Ok(HeaderLine::Ignored));
        assert_eq!(parser.parse_line("* samples = 5"), Ok(HeaderLine::Ignored));
        assert_eq!(parser.config().sample_count, 0);
    }
}
