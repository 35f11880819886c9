//! Dissolved oxygen from an SBE 43 voltage, following Sea-Bird Application Note 64.
//!
//! Oxygen solubility uses the Garcia & Gordon (1992) fit in ml/l. The voltage derivative is
//! a one-sample difference rather than a fixed time window; the sample interval is not
//! consulted.
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::constants::*;
use super::error::OxygenError;
use super::table::DataTable;

// Garcia & Gordon (1992) solubility coefficients, ml/l
const SOL_A: [f64; 6] = [2.00907, 3.22014, 4.0501, 4.94457, -0.256847, 3.88767];
const SOL_B: [f64; 4] = [-0.00624523, -0.00737614, -0.010341, -0.00817083];
const SOL_C0: f64 = -4.88682e-07;

/// SBE 43 calibration coefficients, as printed on the calibration sheet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OxygenCoefficients {
    pub soc: f64,
    pub offset: f64,
    pub tau20: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub e: f64,
    pub d1: f64,
    pub d2: f64,
}

/// Oxygen solubility (ml/l) of seawater at temperature (degC) and salinity (psu)
pub fn oxygen_solubility(temperature: f64, salinity: f64) -> f64 {
    let ts = ((298.15 - temperature) / (KELVIN_OFFSET + temperature)).ln();
    let a = SOL_A
        .iter()
        .enumerate()
        .fold(0.0, |sum, (n, coef)| sum + coef * ts.powi(n as i32));
    let b = SOL_B
        .iter()
        .enumerate()
        .fold(0.0, |sum, (n, coef)| sum + coef * ts.powi(n as i32));
    (a + salinity * b + SOL_C0 * salinity * salinity).exp()
}

impl OxygenCoefficients {
    /// Oxygen (ml/l) for a single sample, given the change in voltage since the previous one
    pub fn oxygen(
        &self,
        voltage: f64,
        dvdt: f64,
        temperature: f64,
        pressure: f64,
        salinity: f64,
    ) -> f64 {
        let tau = self.tau20 * (self.d1 * pressure + self.d2 * (temperature - 20.0)).exp();
        let kelvin = temperature + KELVIN_OFFSET;
        self.soc
            * (voltage + self.offset + tau * dvdt)
            * oxygen_solubility(temperature, salinity)
            * (1.0
                + self.a * temperature
                + self.b * temperature.powi(2)
                + self.c * temperature.powi(3))
            * (self.e * pressure / kelvin).exp()
    }
}

fn required<'a>(
    table: &'a DataTable,
    name: &str,
) -> Result<ndarray::ArrayView1<'a, f64>, OxygenError> {
    table
        .column(name)
        .ok_or_else(|| OxygenError::MissingColumn(name.to_string()))
}

/// Compute oxygen for every row of the table.
///
/// The table must contain salinity, temperature, pressure and the named voltage column.
pub fn compute_oxygen(
    table: &DataTable,
    voltage_column: &str,
    coefficients: &OxygenCoefficients,
) -> Result<Array1<f64>, OxygenError> {
    let salinity = required(table, SALINITY_COLUMN)?;
    let temperature = required(table, TEMPERATURE_COLUMN)?;
    let pressure = required(table, PRESSURE_COLUMN)?;
    let voltage = required(table, voltage_column)?;

    // The previous voltage is carried forward; the first row has no derivative
    let mut previous: Option<f64> = None;
    let values = voltage
        .iter()
        .zip(temperature.iter())
        .zip(pressure.iter())
        .zip(salinity.iter())
        .map(|(((v, t), p), s)| {
            let dvdt = previous.map_or(0.0, |prev| v - prev);
            previous = Some(*v);
            coefficients.oxygen(*v, dvdt, *t, *p, *s)
        })
        .collect::<Vec<f64>>();
    Ok(Array1::from_vec(values))
}

/// Append the oxygen column to the table. On error the table is left as it was.
pub fn add_oxygen(
    table: &mut DataTable,
    voltage_column: &str,
    coefficients: &OxygenCoefficients,
) -> Result<(), OxygenError> {
    let oxygen = compute_oxygen(table, voltage_column, coefficients)?;
    table.add_column(OXYGEN_COLUMN, oxygen)?;
    spdlog::info!(
        "Added {} from {} for {} rows",
        OXYGEN_COLUMN,
        voltage_column,
        table.n_rows()
    );
    Ok(())
}
