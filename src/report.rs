//! Aggregator/Reporter
//!
//! Per-client and per-tag timing records, their aggregation into throughput
//! and average latency, and the text formats they are printed in.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::workload::OperationKind;

/// Width of one throughput column in result lines and tables.
const COLUMN_WIDTH: usize = 8;

/// Serializes a `Duration` as fractional seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

// == Kind Timing ==
/// Count and accumulated elapsed time of one operation kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KindTiming {
    pub count: u64,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

impl KindTiming {
    pub fn new(count: u64, elapsed: Duration) -> Self {
        Self { count, elapsed }
    }

    /// Operations per second; zero when nothing was timed.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if self.count == 0 || secs <= 0.0 {
            0.0
        } else {
            self.count as f64 / secs
        }
    }

    fn add(&mut self, other: &KindTiming) {
        self.count += other.count;
        self.elapsed += other.elapsed;
    }
}

// == Client Result ==
/// Timing buckets produced by one replayed client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientResult {
    pub client_id: usize,
    pub reads: KindTiming,
    pub writes: KindTiming,
    pub cleans: KindTiming,
}

impl ClientResult {
    pub fn new(client_id: usize) -> Self {
        Self {
            client_id,
            reads: KindTiming::default(),
            writes: KindTiming::default(),
            cleans: KindTiming::default(),
        }
    }

    /// Adds one timed operation to the bucket of `kind`.
    pub fn record(&mut self, kind: OperationKind, elapsed: Duration) {
        let bucket = self.bucket_mut(kind);
        bucket.count += 1;
        bucket.elapsed += elapsed;
    }

    pub fn bucket(&self, kind: OperationKind) -> &KindTiming {
        match kind {
            OperationKind::Read => &self.reads,
            OperationKind::Write => &self.writes,
            OperationKind::Clean => &self.cleans,
        }
    }

    fn bucket_mut(&mut self, kind: OperationKind) -> &mut KindTiming {
        match kind {
            OperationKind::Read => &mut self.reads,
            OperationKind::Write => &mut self.writes,
            OperationKind::Clean => &mut self.cleans,
        }
    }

    pub fn total_ops(&self) -> u64 {
        self.reads.count + self.writes.count + self.cleans.count
    }

    pub fn throughput(&self) -> Throughput {
        Throughput {
            reads: self.reads.throughput(),
            writes: self.writes.throughput(),
            cleans: self.cleans.throughput(),
        }
    }

    /// `Client  3|  812.40|  120.00|    0.00`
    pub fn result_line(&self) -> String {
        format!("Client {:2}{}", self.client_id, self.throughput().columns())
    }
}

// == Throughput ==
/// Operations per second for each kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Throughput {
    pub reads: f64,
    pub writes: f64,
    pub cleans: f64,
}

impl Throughput {
    /// Combines independent client measurements: per kind, total count over
    /// total elapsed time. Idle or fast clients do not skew the figure the way
    /// a mean of per-client rates would.
    pub fn aggregate(results: &[ClientResult]) -> Self {
        let mut reads = KindTiming::default();
        let mut writes = KindTiming::default();
        let mut cleans = KindTiming::default();
        for result in results {
            reads.add(&result.reads);
            writes.add(&result.writes);
            cleans.add(&result.cleans);
        }
        Self {
            reads: reads.throughput(),
            writes: writes.throughput(),
            cleans: cleans.throughput(),
        }
    }

    fn columns(&self) -> String {
        [self.reads, self.writes, self.cleans]
            .iter()
            .map(|v| format!("|{:>w$.2}", v, w = COLUMN_WIDTH))
            .collect()
    }
}

/// Full table for a set of client results, totals on the last line.
pub fn format_client_table(results: &[ClientResult]) -> String {
    let rule = "-".repeat(36);
    let mut lines = vec![
        format!(
            "         |{:>w$}|{:>w$}|{:>w$}",
            "reads",
            "writes",
            "cleans",
            w = COLUMN_WIDTH
        ),
        rule.clone(),
    ];
    lines.extend(results.iter().map(ClientResult::result_line));
    lines.push(rule);
    lines.push(format!("ops/sec  {}", Throughput::aggregate(results).columns()));
    lines.join("\n")
}

// == Tag Timing ==
/// Elapsed time and result size of one "ids matching tag" query.
#[derive(Debug, Clone, PartialEq)]
pub struct TagTiming {
    pub tag: String,
    pub elapsed: Duration,
    pub matched: usize,
}

impl TagTiming {
    /// Per-tag report line with the tag column padded to `tag_width`.
    pub fn line(&self, tag_width: usize) -> String {
        format!(
            "{:<w$} | {:.5} seconds | {:>6} ids",
            self.tag,
            self.elapsed.as_secs_f64(),
            self.matched,
            w = tag_width
        )
    }
}

/// Arithmetic means across all queried tags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagSummary {
    pub tags: usize,
    pub average_time: Duration,
    pub average_matches: f64,
}

impl TagSummary {
    /// Returns `None` for an empty timing set.
    pub fn aggregate(timings: &[TagTiming]) -> Option<Self> {
        if timings.is_empty() {
            return None;
        }
        let n = timings.len();
        let total_time: Duration = timings.iter().map(|t| t.elapsed).sum();
        let total_matches: usize = timings.iter().map(|t| t.matched).sum();
        Some(Self {
            tags: n,
            average_time: mean_duration(total_time, n),
            average_matches: total_matches as f64 / n as f64,
        })
    }

    pub fn line(&self) -> String {
        format!(
            "Average: {:.5} seconds ({:5.2} ids per tag)",
            self.average_time.as_secs_f64(),
            self.average_matches
        )
    }
}

/// `total / n` in whole nanoseconds, for any `n` above zero.
fn mean_duration(total: Duration, n: usize) -> Duration {
    let nanos = total.as_nanos() / n.max(1) as u128;
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}
