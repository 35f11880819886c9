//! The rule table describing the layout of a raw HEX data line.
//!
//! Each line is a run of hex digits with no delimiters. The order of [RULE_TABLE] is the
//! order the fields appear in the line, so a rule which is skipped must also be skipped
//! in byte position. Adding a sensor means appending rows here, not adding branches to the
//! decoder.
use super::constants::*;
use super::instrument::InstrumentConfig;

/// A single arithmetic step used to turn a raw count into a value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleOp {
    Divide(f64),
    Subtract(f64),
}

impl ScaleOp {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Self::Divide(d) => value / d,
            Self::Subtract(s) => value - s,
        }
    }
}

/// Which sensor a field belongs to. The group decides when the field is present in a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorGroup {
    /// Always present
    Main,
    /// Present when the matching "External Voltage N" flag is set in the header
    ExternalVoltage,
    /// Present unless the header explicitly turns the named sensor off
    Optional(&'static str),
    /// Never decoded; the header has no reliable signal for these sensors
    Unsupported(&'static str),
    /// Instrument clock, absent in profile mode
    Clock,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDecodeRule {
    pub group: SensorGroup,
    pub column_name: &'static str,
    pub hex_width: usize,
    pub scaling: &'static [ScaleOp],
}

impl ChannelDecodeRule {
    const fn new(
        group: SensorGroup,
        column_name: &'static str,
        hex_width: usize,
        scaling: &'static [ScaleOp],
    ) -> Self {
        Self {
            group,
            column_name,
            hex_width,
            scaling,
        }
    }

    /// Raw A/D counts are stored as-is
    pub fn is_raw_count(&self) -> bool {
        self.scaling.is_empty()
    }

    /// Apply the scaling operations, in declared order
    pub fn scale(&self, raw: f64) -> f64 {
        self.scaling.iter().fold(raw, |value, op| op.apply(value))
    }

    /// Evaluate whether the instrument configuration excludes this field from the data lines
    pub fn is_skipped(&self, config: &InstrumentConfig) -> bool {
        match self.group {
            SensorGroup::Main => false,
            SensorGroup::ExternalVoltage => !config
                .voltage_channel_flags
                .get(self.column_name)
                .copied()
                .unwrap_or(false),
            SensorGroup::Optional(key) => config.extra_sensor_flags.get(key) == Some(&false),
            SensorGroup::Unsupported(_) => true,
            SensorGroup::Clock => config.mode == PROFILE_MODE,
        }
    }
}

const RAW: &[ScaleOp] = &[];
const FREQUENCY: &[ScaleOp] = &[ScaleOp::Divide(FREQUENCY_DIVISOR)];
const VOLTAGE: &[ScaleOp] = &[ScaleOp::Divide(VOLTAGE_DIVISOR)];
const TEMPERATURE: &[ScaleOp] = &[
    ScaleOp::Divide(TEMPERATURE_DIVISOR),
    ScaleOp::Subtract(TEMPERATURE_OFFSET),
];
const GTD_PRESSURE: &[ScaleOp] = &[ScaleOp::Divide(TEMPERATURE_DIVISOR)];
const OPTODE: &[ScaleOp] = &[
    ScaleOp::Divide(OPTODE_DIVISOR),
    ScaleOp::Subtract(TEMPERATURE_OFFSET),
];
const SBE63_VOLTAGE: &[ScaleOp] = &[ScaleOp::Divide(MICRO_DIVISOR), ScaleOp::Subtract(1.0)];
const SEAFET: &[ScaleOp] = &[ScaleOp::Divide(MICRO_DIVISOR), ScaleOp::Subtract(8.0)];

pub const TIME_COLUMN: &str = "Time, seconds since January 1, 2000";

pub static RULE_TABLE: &[ChannelDecodeRule] = &[
    ChannelDecodeRule::new(SensorGroup::Main, "Temperature A/D Counts", 6, RAW),
    ChannelDecodeRule::new(SensorGroup::Main, "Conductivity Frequency", 6, FREQUENCY),
    ChannelDecodeRule::new(SensorGroup::Main, "Pressure A/D Counts", 6, RAW),
    ChannelDecodeRule::new(
        SensorGroup::Main,
        "Pressure Temperature Compensation Voltage",
        4,
        VOLTAGE,
    ),
    ChannelDecodeRule::new(SensorGroup::ExternalVoltage, "External Voltage 0", 4, VOLTAGE),
    ChannelDecodeRule::new(SensorGroup::ExternalVoltage, "External Voltage 1", 4, VOLTAGE),
    ChannelDecodeRule::new(SensorGroup::ExternalVoltage, "External Voltage 2", 4, VOLTAGE),
    ChannelDecodeRule::new(SensorGroup::ExternalVoltage, "External Voltage 3", 4, VOLTAGE),
    ChannelDecodeRule::new(SensorGroup::ExternalVoltage, "External Voltage 4", 4, VOLTAGE),
    ChannelDecodeRule::new(SensorGroup::ExternalVoltage, "External Voltage 5", 4, VOLTAGE),
    ChannelDecodeRule::new(
        SensorGroup::Optional("SBE38"),
        "SBE38 Temperature",
        6,
        TEMPERATURE,
    ),
    ChannelDecodeRule::new(
        SensorGroup::Optional("WETLABS"),
        "WETLABS Signal Channel 0",
        4,
        RAW,
    ),
    ChannelDecodeRule::new(
        SensorGroup::Optional("WETLABS"),
        "WETLABS Signal Channel 1",
        4,
        RAW,
    ),
    ChannelDecodeRule::new(
        SensorGroup::Optional("WETLABS"),
        "WETLABS Signal Channel 2",
        4,
        RAW,
    ),
    ChannelDecodeRule::new(
        SensorGroup::Optional("GasTensionDevice"),
        "GTD Pressure",
        8,
        GTD_PRESSURE,
    ),
    ChannelDecodeRule::new(
        SensorGroup::Optional("GasTensionDevice"),
        "GTD Temperature",
        6,
        TEMPERATURE,
    ),
    ChannelDecodeRule::new(
        SensorGroup::Unsupported("DualGasTensionDevice"),
        "Dual GTD Pressure",
        8,
        GTD_PRESSURE,
    ),
    ChannelDecodeRule::new(
        SensorGroup::Unsupported("DualGasTensionDevice"),
        "Dual GTD Temperature",
        6,
        TEMPERATURE,
    ),
    ChannelDecodeRule::new(SensorGroup::Optional("OPTODE"), "Optode Oxygen", 6, OPTODE),
    ChannelDecodeRule::new(
        SensorGroup::Optional("SBE63"),
        "SBE63 Oxygen Phase",
        6,
        TEMPERATURE,
    ),
    ChannelDecodeRule::new(
        SensorGroup::Optional("SBE63"),
        "SBE63 Oxygen Temperature Voltage",
        6,
        SBE63_VOLTAGE,
    ),
    ChannelDecodeRule::new(
        SensorGroup::Unsupported("SeaFET"),
        "SeaFET Internal Reference Voltage",
        6,
        SEAFET,
    ),
    ChannelDecodeRule::new(SensorGroup::Clock, TIME_COLUMN, 8, RAW),
];
