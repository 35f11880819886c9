// Header line markers for an SBE 19plus V2 raw HEX upload
pub const END_OF_HEADER: &str = "*END*";
pub const BANNER_PREFIX: &str = "* Sea-Bird";
pub const EXPECTED_SIGNATURE: &str = "* Sea-Bird SBE19plus";
pub const SERIAL_MARKER: &str = "SERIAL NO.";
pub const SAMPLES_PREFIX: &str = "* samples";
pub const MODE_PREFIX: &str = "* mode =";
pub const PRESSURE_SENSOR_PREFIX: &str = "* pressure sensor";
pub const EXTRA_SENSOR_PREFIX: &str = "* SBE 38";
pub const EXT_VOLT_PREFIX: &str = "* Ext Volt";
pub const VOLT_OFFSET_PREFIX: &str = "* volt ";
pub const VOLT_OFFSET_MARKER: &str = "offset =";
pub const CAST_PREFIX: &str = "* cast";

/// Number of comma separated segments in a valid mode line
pub const MODE_SEGMENTS: usize = 3;
/// The mode in which the instrument does not report its clock
pub const PROFILE_MODE: &str = "profile";

// Scale factors from the SBE 19plus V2 manual
pub const FREQUENCY_DIVISOR: f64 = 256.0;
pub const VOLTAGE_DIVISOR: f64 = 13_107.0;
pub const TEMPERATURE_DIVISOR: f64 = 100_000.0;
pub const TEMPERATURE_OFFSET: f64 = 10.0;
pub const OPTODE_DIVISOR: f64 = 10_000.0;
pub const MICRO_DIVISOR: f64 = 1_000_000.0;

/// Expected output column names for quantities consumed by derived equations
pub const SALINITY_COLUMN: &str = "Salinity (psu)";
pub const TEMPERATURE_COLUMN: &str = "Temperature (degC)";
pub const PRESSURE_COLUMN: &str = "Pressure (dbars)";
pub const OXYGEN_COLUMN: &str = "Oxygen (ml_per_l)";

/// Upper bound on the rows pre-allocated from the header sample count. Columns grow past it
/// as data arrives.
pub const MAX_PRESIZED_ROWS: usize = 1 << 20;

/// Zero of Celsius in Kelvin
pub const KELVIN_OFFSET: f64 = 273.15;
