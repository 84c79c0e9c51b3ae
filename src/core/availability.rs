// Fraction of grid slots holding data in a window

use crate::core::error::Result;
use crate::core::source::WindCubeSource;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::pin::pin;
use tracing::debug;

impl WindCubeSource {
    pub async fn availability(
        &self,
        path: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<f64> {
        let expected = self.grid.slots_in_window(begin, end)?;
        if expected == 0 {
            return Ok(0.0);
        }

        let spans = self.grid.spans(begin, end)?;
        let mut days = pin!(self.day_stream(path, &spans));
        let mut valid = 0;

        while let Some((span, day)) = days.next().await {
            valid += day?.valid_slots(span.slots.clone());
        }

        debug!("availability {} [{}, {}): {}/{}", path, begin, end, valid, expected);
        Ok(valid as f64 / expected as f64)
    }
}
