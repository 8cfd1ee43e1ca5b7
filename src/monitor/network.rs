// SPDX-License-Identifier: MPL-2.0

//! # Network Throughput Sampling
//!
//! This module polls one network adapter's cumulative rx/tx byte counters via
//! the `sysinfo` crate and turns them into a smoothed throughput estimate.
//!
//! ## Two-level cadence
//!
//! Sampling runs in bursts: every burst takes [`BURST_LEN`] micro-samples at
//! [`MICRO_INTERVAL`] spacing (100 ms), each producing one instantaneous rate
//! that is pushed into a bounded window of the last [`WINDOW_LEN`] samples
//! (~2 s of activity). After the burst the arithmetic mean of the window is
//! emitted as one [`SmoothedRate`], roughly once per second. Fast
//! micro-sampling damps jitter from bursty traffic; the short window keeps
//! the display from lagging multiple seconds behind.
//!
//! ## Fault policy
//!
//! - A micro-sample with a non-positive elapsed time or a counter that went
//!   backwards (rollover, driver reset) is discarded; the burst continues.
//! - An adapter that cannot be read for an entire burst produces no emission
//!   for that tick. The caller keeps displaying the previous reading.
//!
//! Rates stay in bytes per second throughout; Mbps conversion happens only at
//! the formatting boundary in the icon renderer.

use log::{debug, warn};
use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};
use sysinfo::Networks;
use thiserror::Error;

/// Spacing between micro-samples within a burst.
pub const MICRO_INTERVAL: Duration = Duration::from_millis(100);

/// Micro-samples per reporting tick (~1 s of wall time).
pub const BURST_LEN: usize = 10;

/// Bounded history window length (~2 s at 100 ms spacing).
pub const WINDOW_LEN: usize = 20;

/// Faults raised while taking a single micro-sample or reading the adapter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SampleFault {
    /// The configured adapter is gone or exposes no counters.
    #[error("network adapter unavailable")]
    AdapterUnavailable,
    /// Clock anomaly: the snapshot is not newer than the previous one.
    #[error("non-positive sample interval")]
    NonPositiveInterval,
    /// A cumulative counter went backwards (rollover or adapter reset).
    #[error("counter went backwards")]
    CounterRollover,
}

/// One reading of the adapter's cumulative byte counters.
#[derive(Debug, Clone, Copy)]
pub struct CounterSnapshot {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub taken_at: Instant,
}

/// One instantaneous rate pair derived from two consecutive snapshots.
#[derive(Debug, Clone, Copy)]
pub struct RateSample {
    pub rx_bytes_per_sec: f64,
    pub tx_bytes_per_sec: f64,
}

/// The smoothed rate pair emitted once per burst, in bytes per second.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SmoothedRate {
    pub rx_bytes_per_sec: f64,
    pub tx_bytes_per_sec: f64,
}

/// Bounded, time-ordered window of the most recent rate samples.
#[derive(Debug)]
pub struct HistoryWindow {
    samples: VecDeque<RateSample>,
    cap: usize,
}

impl HistoryWindow {
    pub fn new(cap: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Push the newest sample, evicting the oldest once the window is full.
    pub fn push(&mut self, sample: RateSample) {
        if self.samples.len() == self.cap {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Arithmetic mean over the window, or `None` while it is empty.
    pub fn mean(&self) -> Option<SmoothedRate> {
        if self.samples.is_empty() {
            return None;
        }
        let n = self.samples.len() as f64;
        let (rx, tx) = self
            .samples
            .iter()
            .fold((0.0, 0.0), |(rx, tx), s| {
                (rx + s.rx_bytes_per_sec, tx + s.tx_bytes_per_sec)
            });
        Some(SmoothedRate {
            rx_bytes_per_sec: rx / n,
            tx_bytes_per_sec: tx / n,
        })
    }
}

/// Samples one adapter's counters and maintains the smoothing window.
pub struct NetworkMonitor {
    networks: Networks,
    device: Option<String>,
    prev: Option<CounterSnapshot>,
    window: HistoryWindow,
}

impl NetworkMonitor {
    pub fn new() -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
            device: None,
            prev: None,
            window: HistoryWindow::new(WINDOW_LEN),
        }
    }

    /// Bind the monitored adapter by interface name.
    ///
    /// `None` resolves to the first enumerated adapter, sorted by name.
    /// Reconfiguring rescans the interface list so an adapter that appeared
    /// since startup can be bound, and resets the window and the previous
    /// snapshot so no stale deltas carry over across adapters.
    pub fn configure(&mut self, device: Option<&str>) {
        self.networks.refresh_list();
        self.device = match device {
            Some(name) => Some(name.to_string()),
            None => {
                let mut names: Vec<String> = self
                    .networks
                    .iter()
                    .map(|(name, _)| name.clone())
                    .collect();
                names.sort();
                names.into_iter().next()
            }
        };
        self.prev = None;
        self.window.clear();
        debug!("monitoring adapter {:?}", self.device);
    }

    /// Name of the adapter currently bound, if any.
    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    /// Read the bound adapter's cumulative counters.
    ///
    /// Rescans the interface list rather than refreshing known entries only:
    /// a removed adapter must drop out of the list (so the caller retains
    /// its last reading instead of decaying to zero on frozen counters), and
    /// a newly plugged-in adapter must become visible.
    fn read_counters(&mut self) -> Result<CounterSnapshot, SampleFault> {
        let device = self.device.as_deref().ok_or(SampleFault::AdapterUnavailable)?;
        self.networks.refresh_list();
        for (name, data) in &self.networks {
            if name == device {
                return Ok(CounterSnapshot {
                    rx_bytes: data.total_received(),
                    tx_bytes: data.total_transmitted(),
                    taken_at: Instant::now(),
                });
            }
        }
        Err(SampleFault::AdapterUnavailable)
    }

    /// Fold one counter snapshot into the window.
    ///
    /// The previous snapshot is replaced in every case, including the
    /// discarded ones, so a rollover costs exactly one micro-sample.
    fn record(&mut self, snapshot: CounterSnapshot) -> Result<(), SampleFault> {
        let prev = match self.prev.replace(snapshot) {
            Some(prev) => prev,
            None => return Ok(()), // first snapshot only seeds the baseline
        };

        let elapsed = snapshot
            .taken_at
            .saturating_duration_since(prev.taken_at)
            .as_secs_f64();
        if elapsed <= 0.0 {
            return Err(SampleFault::NonPositiveInterval);
        }
        if snapshot.rx_bytes < prev.rx_bytes || snapshot.tx_bytes < prev.tx_bytes {
            return Err(SampleFault::CounterRollover);
        }

        self.window.push(RateSample {
            rx_bytes_per_sec: (snapshot.rx_bytes - prev.rx_bytes) as f64 / elapsed,
            tx_bytes_per_sec: (snapshot.tx_bytes - prev.tx_bytes) as f64 / elapsed,
        });
        Ok(())
    }

    /// Run one reporting tick: a burst of micro-samples followed by one
    /// emission.
    ///
    /// Blocks the calling thread for roughly [`BURST_LEN`] × 100 ms. Returns
    /// `None` when the adapter was unreadable for the whole burst or the
    /// window is still empty; the caller should keep its previous reading.
    pub fn sample_burst(&mut self) -> Option<SmoothedRate> {
        let mut unreadable = 0usize;
        for _ in 0..BURST_LEN {
            thread::sleep(MICRO_INTERVAL);
            match self.read_counters() {
                Ok(snapshot) => {
                    if let Err(fault) = self.record(snapshot) {
                        debug!("discarded micro-sample: {fault}");
                    }
                }
                Err(fault) => {
                    unreadable += 1;
                    debug!("micro-sample failed: {fault}");
                }
            }
        }

        if unreadable == BURST_LEN {
            warn!(
                "adapter {:?} unreadable for a full burst, keeping last reading",
                self.device
            );
            return None;
        }
        self.window.mean()
    }
}

/// Enumerate adapter names, sorted for a stable menu order.
pub fn list_adapters() -> Vec<String> {
    let networks = Networks::new_with_refreshed_list();
    let mut names: Vec<String> = networks.iter().map(|(name, _)| name.clone()).collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(rx: f64, tx: f64) -> RateSample {
        RateSample {
            rx_bytes_per_sec: rx,
            tx_bytes_per_sec: tx,
        }
    }

    fn snapshot(rx: u64, tx: u64, at: Instant) -> CounterSnapshot {
        CounterSnapshot {
            rx_bytes: rx,
            tx_bytes: tx,
            taken_at: at,
        }
    }

    /// Monitor with a fixed device name so `record` can be driven directly.
    fn test_monitor() -> NetworkMonitor {
        let mut monitor = NetworkMonitor::new();
        monitor.device = Some(String::from("test0"));
        monitor.prev = None;
        monitor.window.clear();
        monitor
    }

    #[test]
    fn window_never_exceeds_its_bound() {
        let mut window = HistoryWindow::new(WINDOW_LEN);
        for i in 0..(WINDOW_LEN * 3) {
            window.push(sample(i as f64, 0.0));
            assert!(window.len() <= WINDOW_LEN);
        }
        assert_eq!(window.len(), WINDOW_LEN);
    }

    #[test]
    fn window_evicts_oldest_first() {
        let mut window = HistoryWindow::new(3);
        for i in 0..3 {
            window.push(sample(i as f64, 0.0));
        }
        // Mean of {0,1,2} is 1; pushing 9 evicts the 0.
        window.push(sample(9.0, 0.0));
        let mean = window.mean().unwrap();
        assert!((mean.rx_bytes_per_sec - 4.0).abs() < 1e-9);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn empty_window_has_no_mean() {
        let window = HistoryWindow::new(WINDOW_LEN);
        assert!(window.mean().is_none());
    }

    #[test]
    fn constant_input_rate_converges_to_itself() {
        let mut monitor = test_monitor();
        let start = Instant::now();
        // 1000 bytes rx / 500 bytes tx every 100 ms = 10_000 / 5_000 per sec.
        for i in 0..(WINDOW_LEN as u64 + 5) {
            let at = start + Duration::from_millis(100 * i);
            let _ = monitor.record(snapshot(1000 * i, 500 * i, at));
        }
        let mean = monitor.window.mean().unwrap();
        assert!((mean.rx_bytes_per_sec - 10_000.0).abs() < 1e-6);
        assert!((mean.tx_bytes_per_sec - 5_000.0).abs() < 1e-6);
    }

    #[test]
    fn rates_are_never_negative_across_rollover() {
        let mut monitor = test_monitor();
        let start = Instant::now();
        let _ = monitor.record(snapshot(1_000_000, 1_000_000, start));
        let _ = monitor.record(snapshot(
            1_100_000,
            1_050_000,
            start + Duration::from_millis(100),
        ));
        // Counter resets below the previous value: discarded, not negative.
        let fault = monitor
            .record(snapshot(500, 200, start + Duration::from_millis(200)))
            .unwrap_err();
        assert_eq!(fault, SampleFault::CounterRollover);

        let mean = monitor.window.mean().unwrap();
        assert!(mean.rx_bytes_per_sec >= 0.0);
        assert!(mean.tx_bytes_per_sec >= 0.0);

        // Next delta is measured against the rollover snapshot.
        monitor
            .record(snapshot(1_500, 1_200, start + Duration::from_millis(300)))
            .unwrap();
    }

    #[test]
    fn non_positive_interval_is_discarded() {
        let mut monitor = test_monitor();
        let at = Instant::now();
        let _ = monitor.record(snapshot(1_000, 1_000, at));
        let fault = monitor.record(snapshot(2_000, 2_000, at)).unwrap_err();
        assert_eq!(fault, SampleFault::NonPositiveInterval);
        assert!(monitor.window.is_empty());
    }

    #[test]
    fn discarded_samples_leave_the_window_unchanged() {
        let mut monitor = test_monitor();
        let start = Instant::now();
        let _ = monitor.record(snapshot(0, 0, start));
        monitor
            .record(snapshot(1_000, 0, start + Duration::from_millis(100)))
            .unwrap();
        let before = monitor.window.mean().unwrap();

        let _ = monitor.record(snapshot(100, 0, start + Duration::from_millis(200)));
        assert_eq!(monitor.window.mean().unwrap(), before);
    }

    #[test]
    fn reconfigure_resets_history() {
        let mut monitor = test_monitor();
        let start = Instant::now();
        let _ = monitor.record(snapshot(0, 0, start));
        monitor
            .record(snapshot(1_000, 0, start + Duration::from_millis(100)))
            .unwrap();
        assert!(!monitor.window.is_empty());

        monitor.configure(Some("other0"));
        assert!(monitor.window.is_empty());
        assert!(monitor.prev.is_none());
        assert_eq!(monitor.device(), Some("other0"));
    }

    #[test]
    fn configure_resolves_against_a_fresh_scan() {
        let mut monitor = NetworkMonitor::new();
        monitor.configure(None);
        // Both sides rescan, so they agree on the first adapter by name
        // (or on there being none at all).
        assert_eq!(
            monitor.device().map(str::to_string),
            list_adapters().into_iter().next()
        );
    }

    #[test]
    fn unreadable_burst_emits_nothing_and_retains_the_window() {
        let mut monitor = test_monitor();
        let start = Instant::now();
        let _ = monitor.record(snapshot(0, 0, start));
        monitor
            .record(snapshot(1_000, 500, start + Duration::from_millis(100)))
            .unwrap();
        let before = monitor.window.mean().unwrap();

        // "test0" matches no real interface, so every micro-sample of the
        // burst fails and the previous reading stays available.
        assert!(monitor.sample_burst().is_none());
        assert_eq!(monitor.window.mean().unwrap(), before);
    }

    #[test]
    fn unconfigured_monitor_reports_adapter_unavailable() {
        let mut monitor = NetworkMonitor::new();
        monitor.device = None;
        assert_eq!(
            monitor.read_counters().unwrap_err(),
            SampleFault::AdapterUnavailable
        );
    }
}
