// Earliest and latest addressable instants of a path

use crate::core::error::Result;
use crate::core::grid::day_start;
use crate::core::source::WindCubeSource;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::info;

impl WindCubeSource {
    /// Scan forward from the earliest and backward from the latest day file
    /// until a day with at least one decodable row turns up.
    pub async fn time_range(&self, path: &str) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let days = self.locator.list_days(path).await?;

        let Some(first) = self.first_populated(path, days.iter().copied()).await? else {
            info!("time range {}: no data", path);
            return Ok((DateTime::<Utc>::UNIX_EPOCH, DateTime::<Utc>::UNIX_EPOCH));
        };

        // The forward scan found data, so the backward scan stops at `first` at the latest
        let last = self
            .first_populated(path, days.iter().rev().copied().take_while(|d| *d >= first))
            .await?
            .unwrap_or(first);

        let range = (day_start(first), day_start(last) + Duration::days(1));
        info!("time range {}: [{}, {})", path, range.0, range.1);
        Ok(range)
    }

    async fn first_populated(
        &self,
        path: &str,
        days: impl Iterator<Item = NaiveDate>,
    ) -> Result<Option<NaiveDate>> {
        for date in days {
            if self.load_day(path, date).await?.has_data() {
                return Ok(Some(date));
            }
        }
        Ok(None)
    }
}
