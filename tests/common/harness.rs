//! tests/common/harness.rs
//!
//! A deterministic single-link simulation driving one controller: segments
//! are paced at whatever rate the controller currently publishes, and
//! acknowledgments are scripted, optionally with a lost hole per delivery.
//! Core invariants are re-checked after every event.

use std::sync::Once;
use std::time::{Duration, Instant};

use petrel_pacing::config::Config;
use petrel_pacing::congestion::CongestionControl;
use petrel_pacing::core::decision::Phase;
use petrel_pacing::core::Pcc;
use petrel_pacing::event::sack::SackRange;
use petrel_pacing::event::{AckReport, TransmitReport};

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter = std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "petrel_pacing=info".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// A test harness simulating one paced link with scripted acknowledgments.
pub struct LinkHarness {
    pub controller: Pcc,
    pub now: Instant,
    segment_size: u64,
    minimum_rate: u64,
    send_cursor: u64,
    acked_floor: u64,
    rtt: Duration,
    /// Whether delivered acknowledgments carry an RTT sample. Turned off by
    /// scripts that need acknowledgment replay to be a strict no-op.
    pub rtt_in_acks: bool,
    /// Every distinct pacing rate observed, in order of appearance.
    pub rates_seen: Vec<u64>,
    /// Every distinct phase observed, in order of appearance.
    pub phases_seen: Vec<Phase>,
}

impl LinkHarness {
    pub fn new(config: Config, rtt: Duration) -> Self {
        init_tracing();
        let now = Instant::now();
        let segment_size = config.monitor.segment_size;
        let minimum_rate = config.pacing.minimum_rate;
        let controller = Pcc::new(config, now).expect("harness config must be valid");
        let mut harness = Self {
            controller,
            now,
            segment_size,
            minimum_rate,
            send_cursor: 0,
            acked_floor: 0,
            rtt,
            rtt_in_acks: true,
            rates_seen: Vec::new(),
            phases_seen: Vec::new(),
        };
        harness.check_invariants();
        harness
    }

    /// Re-checks the properties that must hold after every single event.
    fn check_invariants(&mut self) {
        let snapshot = self.controller.snapshot();
        assert_eq!(
            snapshot.sending_intervals, 1,
            "exactly one interval may be sending"
        );
        assert!(
            snapshot.pacing_rate >= self.minimum_rate,
            "published rate {} fell below the floor {}",
            snapshot.pacing_rate,
            self.minimum_rate
        );
        if self.rates_seen.last() != Some(&snapshot.pacing_rate) {
            self.rates_seen.push(snapshot.pacing_rate);
        }
        if self.phases_seen.last() != Some(&snapshot.phase) {
            self.phases_seen.push(snapshot.phase);
        }
    }

    pub fn phase(&self) -> Phase {
        self.controller.snapshot().phase
    }

    pub fn pacing_rate(&self) -> u64 {
        self.controller.pacing_rate()
    }

    /// Transmits one segment, spaced by the currently published rate.
    pub fn pace_one_segment(&mut self) {
        let rate = self.controller.pacing_rate().max(1);
        let spacing_us = (self.segment_size * 1_000_000).div_ceil(rate).max(1);
        self.now += Duration::from_micros(spacing_us);
        self.send_cursor += self.segment_size;
        let report = TransmitReport {
            send_cursor: self.send_cursor,
            segments_delta: 1,
        };
        self.controller.on_transmit(self.now, &report);
        self.check_invariants();
    }

    /// Acknowledges everything outstanding. `loss_per_mille` of the newly
    /// covered span is reported as a lost hole just above the old cursor.
    pub fn deliver(&mut self, loss_per_mille: u64) {
        self.deliver_times(loss_per_mille, 1);
    }

    /// Like [`Self::deliver`], but feeds the identical report `times` times,
    /// as a duplicated acknowledgment would.
    pub fn deliver_times(&mut self, loss_per_mille: u64, times: usize) {
        let span = self.send_cursor - self.acked_floor;
        let hole = span * loss_per_mille / 1000;

        let (cumulative_ack, blocks) = if hole == 0 {
            (self.send_cursor, Vec::new())
        } else {
            // Everything above the hole arrived; the hole itself is lost.
            let blocks = vec![SackRange {
                start: self.acked_floor + hole,
                end: self.send_cursor,
            }];
            (self.acked_floor, blocks)
        };

        let report = AckReport {
            rtt_sample: self.rtt_in_acks.then_some(self.rtt),
            cumulative_ack,
            sack_blocks: &blocks,
        };
        for _ in 0..times {
            self.controller.on_ack(self.now, &report);
            self.check_invariants();
        }
        self.acked_floor = self.send_cursor;
    }

    /// Paces segments for `duration` of simulated time, delivering an
    /// acknowledgment every `ack_every`.
    pub fn run(&mut self, duration: Duration, ack_every: Duration, loss_per_mille: u64) {
        let end = self.now + duration;
        let mut next_ack = self.now + ack_every;
        while self.now < end {
            self.pace_one_segment();
            if self.now >= next_ack {
                self.deliver(loss_per_mille);
                next_ack = self.now + ack_every;
            }
        }
    }
}
