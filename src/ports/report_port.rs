//! Dashboard output port.

use crate::domain::dashboard::DashboardOutcome;
use crate::domain::error::IndexboardError;

/// Port for writing a rendered dashboard to a destination.
pub trait ReportPort {
    /// Writes the outcome to `output_path`. A `NoValidData` outcome still
    /// produces output carrying the error message and any warnings.
    fn write(&self, outcome: &DashboardOutcome, output_path: &str)
        -> Result<(), IndexboardError>;
}
