// WindCube data source: catalog plus the shared day loading pipeline

use crate::core::config::SourceConfig;
use crate::core::decoder::DayContent;
use crate::core::error::{Result, WindCubeError};
use crate::core::format::{Catalog, ReadRequest, Resource};
use crate::core::grid::{AlignedDay, DaySpan, Grid};
use crate::core::locator::FileLocator;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures::{stream, Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Receives read progress as a fraction in `[0, 1]`.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: f64);
}

impl<F> ProgressSink for F
where
    F: Fn(f64) + Send + Sync,
{
    fn report(&self, progress: f64) {
        self(progress)
    }
}

/// Discards progress updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _progress: f64) {}
}

/// The four operations a host needs from a data source.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Resources of `path`, in column order of its first day file.
    async fn get_catalog(&self, path: &str) -> Result<Catalog>;

    /// Start of the first and end (exclusive) of the last day holding
    /// data; `(epoch, epoch)` when there is none.
    async fn get_time_range(&self, path: &str) -> Result<(DateTime<Utc>, DateTime<Utc>)>;

    /// Fraction of grid slots in `[begin, end)` that hold data.
    async fn get_availability(
        &self,
        path: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<f64>;

    /// Fill every request's buffer for `[begin, end)`.
    ///
    /// On cancellation the call returns `Ok(())` after the current day:
    /// days already written stay valid, the rest keep status 0.
    async fn read(
        &self,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        requests: &mut [ReadRequest<'_>],
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct WindCubeSource {
    pub(crate) config: SourceConfig,
    pub(crate) locator: FileLocator,
    pub(crate) grid: Grid,
}

impl WindCubeSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            locator: FileLocator::new(&config.root, config.file_pattern.clone()),
            grid: Grid::new(config.sample_period_secs),
            config,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub async fn catalog(&self, path: &str) -> Result<Catalog> {
        let days = self.locator.list_days(path).await?;
        let first = *days
            .first()
            .ok_or_else(|| WindCubeError::Schema(format!("no day file found for {}", path)))?;

        let file = self
            .locator
            .locate(path, first)
            .await?
            .ok_or_else(|| WindCubeError::Schema(format!("day file for {} on {} vanished", path, first)))?;

        let schema = DayContent::parse(file.read_text().await?, self.config.delimiter)?.into_schema();
        info!(
            "catalog {}: {} resources from {}",
            path,
            schema.channels.len(),
            file.path.display()
        );

        Ok(Catalog {
            id: path.to_string(),
            resources: schema
                .channels
                .iter()
                .map(|channel| Resource::from_channel(channel, self.config.sample_period_secs))
                .collect(),
            properties: schema.properties,
        })
    }

    /// Decode and align one day. A missing file, or one whose header
    /// cannot be parsed, is an empty day.
    pub async fn load_day(&self, path: &str, date: NaiveDate) -> Result<AlignedDay> {
        let Some(file) = self.locator.locate(path, date).await? else {
            return Ok(AlignedDay::empty(date, &self.grid));
        };

        let text = file.read_text().await?;
        match DayContent::parse(text, self.config.delimiter) {
            Ok(content) => Ok(AlignedDay::align(date, &content, &self.grid)),
            Err(e) => {
                warn!("ignoring {}: {}", file.path.display(), e);
                Ok(AlignedDay::empty(date, &self.grid))
            }
        }
    }

    /// Days of `spans` decoded concurrently, at most `max_open_files` at a
    /// time, yielded in span order.
    pub(crate) fn day_stream<'a>(
        &'a self,
        path: &'a str,
        spans: &'a [DaySpan],
    ) -> impl Stream<Item = (&'a DaySpan, Result<AlignedDay>)> + 'a {
        stream::iter(spans)
            .map(move |span| async move {
                debug!("loading {} {}", path, span.date);
                (span, self.load_day(path, span.date).await)
            })
            .buffered(self.config.max_open_files)
    }
}

#[async_trait]
impl DataSource for WindCubeSource {
    async fn get_catalog(&self, path: &str) -> Result<Catalog> {
        self.catalog(path).await
    }

    async fn get_time_range(&self, path: &str) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        self.time_range(path).await
    }

    async fn get_availability(
        &self,
        path: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<f64> {
        self.availability(path, begin, end).await
    }

    async fn read(
        &self,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        requests: &mut [ReadRequest<'_>],
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.read_batch(begin, end, requests, progress, cancel).await
    }
}
