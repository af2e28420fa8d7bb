//! Distance command - great-circle distance between two points.

use hazardwatch::geo::{self, Meters};

use crate::error::CliError;

/// Compute the distance between two points.
pub fn compute(from: (f64, f64), to: (f64, f64)) -> Result<Meters, CliError> {
    Ok(geo::distance(from, to)?)
}

/// Run the distance command.
pub fn run(from: (f64, f64), to: (f64, f64)) -> Result<(), CliError> {
    let distance = compute(from, to)?;
    println!("{:.1} m", distance.value());
    Ok(())
}
