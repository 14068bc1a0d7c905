//! Date-axis tick thinning.

use crate::domain::error::ChartError;
use crate::domain::layout::AxisTick;
use chrono::NaiveDate;

pub const DEFAULT_TICK_STEP: usize = 3;

/// One tick per `step` consecutive rows, placed on the first row of each
/// group and labelled `MM/DD`.
pub fn thin_date_ticks(dates: &[NaiveDate], step: usize) -> Result<Vec<AxisTick>, ChartError> {
    if step == 0 {
        return Err(ChartError::invalid_parameter(
            "tick step",
            "tick step must be positive",
        ));
    }
    Ok(dates
        .iter()
        .enumerate()
        .step_by(step)
        .map(|(position, date)| AxisTick {
            position,
            label: date.format("%m/%d").to_string(),
        })
        .collect())
}
