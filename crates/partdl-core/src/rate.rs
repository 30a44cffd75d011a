//! Throughput estimation and status-line formatting
//!
//! Consumes the session's progress events one at a time and maintains an
//! adaptively smoothed rate estimate: the newest sample's weight starts at
//! 1 (full replacement) and decays toward a floor of 0.001 as samples
//! accumulate, so early noisy samples dominate briefly and the estimate
//! then stabilizes without ever going fully static.

use std::time::{Duration, Instant};

use partdl_types::ProgressEvent;

use crate::units::{si_format, FloatFormat, SiOptions};

/// Floor for the smoothing weight.
const MIN_ALPHA: f64 = 1e-3;

/// Smoothed-throughput estimator with a human-readable status line.
///
/// State is reset by constructing a fresh estimator for a new session.
/// Stalled events leave the state untouched so a transient outage does not
/// corrupt the estimate.
#[derive(Debug, Default)]
pub struct RateEstimator {
    last_instant: Option<Instant>,
    last_bytes: u64,
    last_total: u64,
    smoothed_rate: f64,
    samples: u64,
    ascii: bool,
}

impl RateEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render prefixes in ASCII (`u` for micro, `+/-` for ±).
    pub fn ascii(mut self, ascii: bool) -> Self {
        self.ascii = ascii;
        self
    }

    /// Consume one progress event and return the formatted status line.
    pub fn update(&mut self, event: &ProgressEvent) -> String {
        self.observe_at(event, Instant::now())
    }

    /// Like [`update`](Self::update) with an explicit sample time.
    pub fn observe_at(&mut self, event: &ProgressEvent, now: Instant) -> String {
        if let Some(error) = &event.error {
            // No rate update: bytes_so_far did not advance.
            return format!(
                "{:.2}% ({} / {})  [stalled; retrying...] {}",
                event.percent(),
                self.format_bytes(event.bytes_so_far, 2),
                self.format_bytes(event.total_bytes, 1),
                error
            );
        }

        if let Some(last) = self.last_instant {
            let dt = now.saturating_duration_since(last).as_secs_f64();
            if dt > 0.0 {
                let instant_rate =
                    event.bytes_so_far.saturating_sub(self.last_bytes) as f64 / dt;
                self.samples += 1;
                let alpha = (1.0 / self.samples as f64).max(MIN_ALPHA);
                self.smoothed_rate =
                    alpha * instant_rate + (1.0 - alpha) * self.smoothed_rate;
            }
        }
        self.last_instant = Some(now);
        self.last_bytes = event.bytes_so_far;
        self.last_total = event.total_bytes;

        let eta = match self.eta() {
            Some(eta) => format_duration(eta.as_secs()),
            None => String::new(),
        };
        let rate = si_format(
            self.smoothed_rate,
            "B/s",
            &SiOptions {
                precision: 3,
                float_format: FloatFormat::Fixed,
                allow_unicode: !self.ascii,
                ..SiOptions::default()
            },
        );

        format!(
            "{:.2}% ({} / {})  {}  {} remaining",
            event.percent(),
            self.format_bytes(event.bytes_so_far, 2),
            self.format_bytes(event.total_bytes, 1),
            rate,
            eta
        )
    }

    /// Smoothed throughput in bytes per second. Zero until two samples exist.
    pub fn rate(&self) -> f64 {
        self.smoothed_rate
    }

    /// Number of rate samples folded into the estimate so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Estimated time remaining, unknown while the rate is zero.
    pub fn eta(&self) -> Option<Duration> {
        if self.smoothed_rate <= 0.0 {
            return None;
        }
        let remaining = self.last_total.saturating_sub(self.last_bytes) as f64;
        Some(Duration::from_secs_f64(remaining / self.smoothed_rate))
    }

    fn format_bytes(&self, bytes: u64, precision: usize) -> String {
        si_format(
            bytes as f64,
            "B",
            &SiOptions {
                precision,
                float_format: FloatFormat::Fixed,
                allow_unicode: !self.ascii,
                ..SiOptions::default()
            },
        )
    }
}

/// `H:MM:SS` with days spelled out, e.g. `0:01:40` or `1 day, 2:00:00`.
fn format_duration(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let rem = total_secs % 86_400;
    let clock = format!("{}:{:02}:{:02}", rem / 3600, (rem % 3600) / 60, rem % 60);
    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        n => format!("{} days, {}", n, clock),
    }
}
