// Read engine: per-day decode and slot writes into caller buffers

use crate::core::error::{Result, WindCubeError};
use crate::core::format::ReadRequest;
use crate::core::grid::{AlignedDay, DaySpan};
use crate::core::source::{ProgressSink, WindCubeSource};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::pin::pin;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

impl WindCubeSource {
    pub async fn read_batch(
        &self,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        requests: &mut [ReadRequest<'_>],
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let expected = self.grid.slots_in_window(begin, end)?;
        self.check_requests(requests, expected)?;

        let spans = self.grid.spans(begin, end)?;

        // Requests sharing a catalog share one decode per day
        let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
        for (index, request) in requests.iter().enumerate() {
            let path = &request.item.catalog_id;
            match groups.iter_mut().find(|(p, _)| p == path) {
                Some((_, members)) => members.push(index),
                None => groups.push((path.clone(), vec![index])),
            }
        }

        let total = groups.len() * spans.len();
        if total == 0 {
            progress.report(1.0);
            return Ok(());
        }

        info!(
            "read [{}, {}): {} requests, {} catalogs, {} days",
            begin,
            end,
            requests.len(),
            groups.len(),
            spans.len()
        );

        let mut done = 0;
        for (path, members) in &groups {
            let mut days = pin!(self.day_stream(path, &spans));

            while let Some((span, day)) = days.next().await {
                if cancel.is_cancelled() {
                    warn!("read cancelled after {}/{} day units", done, total);
                    return Ok(());
                }

                let day = day?;
                for &index in members {
                    write_span(&mut requests[index], span, &day);
                }

                done += 1;
                progress.report(done as f64 / total as f64);
            }
        }

        Ok(())
    }

    fn check_requests(&self, requests: &[ReadRequest<'_>], expected: usize) -> Result<()> {
        for request in requests {
            let representation = &request.item.representation;
            if representation.sample_period_secs != self.config.sample_period_secs {
                return Err(WindCubeError::UnsupportedRepresentation(format!(
                    "{}/{}: period {} s, source grid is {} s",
                    request.item.resource.id,
                    representation.id(),
                    representation.sample_period_secs,
                    self.config.sample_period_secs
                )));
            }

            let buffer = &request.buffer;
            if buffer.data.len() != expected || buffer.status.len() != expected {
                return Err(WindCubeError::BufferSize {
                    resource: request.item.resource.id.clone(),
                    expected,
                    data: buffer.data.len(),
                    status: buffer.status.len(),
                });
            }
        }
        Ok(())
    }
}

/// Overwrite the buffer region of `span`. Slots without a value are reset
/// to the default so a reused buffer holds no stale samples.
fn write_span(request: &mut ReadRequest<'_>, span: &DaySpan, day: &AlignedDay) {
    let target = span.target..span.target + span.slots.len();
    let data = &mut request.buffer.data[target.clone()];
    let status = &mut request.buffer.status[target];

    let Some(column) = day.column_of(&request.item.resource.id) else {
        data.fill(0.0);
        status.fill(0);
        return;
    };

    let mut written = 0;
    for ((slot, value), flag) in span.slots.clone().zip(data.iter_mut()).zip(status.iter_mut()) {
        match day.value(slot, column) {
            Some(v) => {
                *value = v;
                *flag = 1;
                written += 1;
            }
            None => {
                *value = 0.0;
                *flag = 0;
            }
        }
    }

    debug!("{} {}: {} slots written", request.item.resource.id, day.date, written);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SourceConfig;
    use crate::core::format::{CatalogItem, SampleBuffer};
    use chrono::TimeZone;
    use std::sync::Mutex;

    fn fixture() -> (tempfile::TempDir, WindCubeSource) {
        let dir = tempfile::tempdir().unwrap();
        let month = dir.path().join("R").join("2021-06");
        std::fs::create_dir_all(&month).unwrap();

        for day in 1..=3 {
            let mut text = String::from("Timestamp\tA [V]\tB [V]\n");
            for hour in 0..24 {
                text.push_str(&format!("2021-06-{:02} {:02}:00:00\t{}\t{}\n", day, hour, day * 100 + hour, -1));
            }
            std::fs::write(month.join(format!("2021-06-{:02}.sta", day)), text).unwrap();
        }

        let mut config = SourceConfig::new(dir.path());
        config.sample_period_secs = 3600;
        config.max_open_files = 2;
        (dir, WindCubeSource::new(config).unwrap())
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 6, day, hour, 0, 0).unwrap()
    }

    async fn item(source: &WindCubeSource, id: &str) -> CatalogItem {
        let catalog = source.catalog("/R").await.unwrap();
        let resource = catalog.resources.iter().find(|r| r.id == id).unwrap();
        CatalogItem::new(&catalog, resource, &resource.representations[0])
    }

    #[tokio::test]
    async fn test_reads_across_days() {
        let (_dir, source) = fixture();
        let mut a = SampleBuffer::new(30);
        let mut b = SampleBuffer::new(30);
        let mut requests = [
            ReadRequest::new(item(&source, "A").await, &mut a),
            ReadRequest::new(item(&source, "B").await, &mut b),
        ];

        source
            .read_batch(at(1, 12), at(2, 18), &mut requests, &crate::NoProgress, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(a.data[0], 112.0);
        assert_eq!(a.data[11], 123.0);
        assert_eq!(a.data[12], 200.0);
        assert_eq!(a.data[29], 217.0);
        assert_eq!(a.valid_count(), 30);
        assert!(b.data.iter().all(|v| *v == -1.0));
    }

    #[tokio::test]
    async fn test_missing_day_keeps_defaults() {
        let (_dir, source) = fixture();
        let mut a = SampleBuffer::new(48);
        let mut requests = [ReadRequest::new(item(&source, "A").await, &mut a)];

        source
            .read_batch(at(3, 0), at(5, 0), &mut requests, &crate::NoProgress, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(a.valid_count(), 24);
        assert_eq!(a.data[23], 323.0);
        assert_eq!(&a.status[24..], &[0u8; 24][..]);
        assert!(a.data[24..].iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn test_progress_is_monotonic() {
        let (_dir, source) = fixture();
        let mut a = SampleBuffer::new(72);
        let mut requests = [ReadRequest::new(item(&source, "A").await, &mut a)];
        let seen = Mutex::new(Vec::new());
        let sink = |p: f64| seen.lock().unwrap().push(p);

        source
            .read_batch(at(1, 0), at(4, 0), &mut requests, &sink, &CancellationToken::new())
            .await
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(seen.last(), Some(&1.0));
    }

    #[tokio::test]
    async fn test_cancel_stops_after_current_day() {
        let (_dir, source) = fixture();
        let mut a = SampleBuffer::new(72);
        let mut requests = [ReadRequest::new(item(&source, "A").await, &mut a)];
        let cancel = CancellationToken::new();
        let sink = |p: f64| {
            if p > 0.0 {
                cancel.cancel();
            }
        };

        source
            .read_batch(at(1, 0), at(4, 0), &mut requests, &sink, &cancel)
            .await
            .unwrap();

        assert_eq!(a.valid_count(), 24);
        assert_eq!(a.data[0], 100.0);
        assert!(a.status[24..].iter().all(|s| *s == 0));
    }

    #[tokio::test]
    async fn test_rejects_wrong_buffer_size() {
        let (_dir, source) = fixture();
        let mut a = SampleBuffer::new(10);
        let mut requests = [ReadRequest::new(item(&source, "A").await, &mut a)];

        let err = source
            .read_batch(at(1, 0), at(2, 0), &mut requests, &crate::NoProgress, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WindCubeError::BufferSize { expected: 24, .. }));
    }

    #[tokio::test]
    async fn test_rejects_foreign_period() {
        let (_dir, source) = fixture();
        let mut a = SampleBuffer::new(24);
        let mut hourly = item(&source, "A").await;
        hourly.representation.sample_period_secs = 600;
        let mut requests = [ReadRequest::new(hourly, &mut a)];

        let err = source
            .read_batch(at(1, 0), at(2, 0), &mut requests, &crate::NoProgress, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WindCubeError::UnsupportedRepresentation(_)));
    }

    #[tokio::test]
    async fn test_reused_buffer_is_reset() {
        let (_dir, source) = fixture();
        let mut a = SampleBuffer {
            data: vec![9.0; 48],
            status: vec![1; 48],
        };
        let mut requests = [ReadRequest::new(item(&source, "A").await, &mut a)];

        source
            .read_batch(at(3, 0), at(5, 0), &mut requests, &crate::NoProgress, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(a.valid_count(), 24);
        assert_eq!(a.data[30], 0.0);
    }

    #[tokio::test]
    async fn test_columns_follow_each_day_header() {
        let (dir, source) = fixture();
        let month = dir.path().join("R").join("2021-06");

        let mut swapped = String::from("Timestamp\tB [V]\tA [V]\n");
        let mut only_a = String::from("Timestamp\tA [V]\n");
        for hour in 0..24 {
            swapped.push_str(&format!("2021-06-02 {:02}:00:00\t{}\t{}\n", hour, -2, 200 + hour));
            only_a.push_str(&format!("2021-06-03 {:02}:00:00\t{}\n", hour, 300 + hour));
        }
        std::fs::write(month.join("2021-06-02.sta"), swapped).unwrap();
        std::fs::write(month.join("2021-06-03.sta"), only_a).unwrap();

        let mut a = SampleBuffer::new(72);
        let mut b = SampleBuffer::new(72);
        let mut requests = [
            ReadRequest::new(item(&source, "A").await, &mut a),
            ReadRequest::new(item(&source, "B").await, &mut b),
        ];

        source
            .read_batch(at(1, 0), at(4, 0), &mut requests, &crate::NoProgress, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(a.valid_count(), 72);
        assert_eq!(a.data[5], 105.0);
        assert_eq!(a.data[24 + 5], 205.0);
        assert_eq!(a.data[48 + 5], 305.0);

        assert_eq!(b.valid_count(), 48);
        assert!(b.data[..24].iter().all(|v| *v == -1.0));
        assert!(b.data[24..48].iter().all(|v| *v == -2.0));
        assert!(b.status[48..].iter().all(|s| *s == 0));
        assert!(b.data[48..].iter().all(|v| *v == 0.0));
    }
}
