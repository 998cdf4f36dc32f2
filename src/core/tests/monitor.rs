//! Tests for monitor-interval records and the slot ring.
use std::time::{Duration, Instant};

use crate::core::decision::Phase;
use crate::core::monitor::{IntervalStage, MonitorInterval, MonitorRing, ProbeRole};

#[test]
fn test_probe_roles_index_the_quartet() {
    assert_eq!(ProbeRole::First.index(), 0);
    assert_eq!(ProbeRole::Second.index(), 1);
    assert_eq!(ProbeRole::Third.index(), 2);
    assert_eq!(ProbeRole::Fourth.index(), 3);
}

#[test]
fn test_reseed_clears_the_measurement() {
    let now = Instant::now();
    let mut interval = MonitorInterval::new(now);

    interval.valid = true;
    interval.stage = IntervalStage::AwaitingAcks;
    interval.segments_sent = 42;
    interval.bytes_lost = 1_000;
    interval.end_seq = 99_999;
    interval.target_rate = 123;
    interval.actual_rate = 456;

    let later = now + Duration::from_millis(5);
    interval.reseed(later, 50_000, 10_000, Phase::RateAdjust, None);

    assert!(!interval.valid);
    assert_eq!(interval.stage, IntervalStage::Sending);
    assert_eq!(interval.start_seq, 50_000);
    assert_eq!(interval.end_seq, 0);
    assert_eq!(interval.last_acked_seq, 50_000);
    assert_eq!(interval.segments_sent, 0);
    assert_eq!(interval.bytes_lost, 0);
    assert_eq!(interval.phase, Phase::RateAdjust);
    assert!(interval.utility.is_none());
    assert!(!interval.has_sent_data());
}

#[test]
fn test_bytes_sent_follows_the_segment_counter() {
    let mut interval = MonitorInterval::new(Instant::now());
    interval.segments_sent = 25;
    assert_eq!(interval.bytes_sent(1_200), 30_000);
}

#[test]
fn test_prev_index_wraps() {
    let ring = MonitorRing::new(5, Instant::now());
    assert_eq!(ring.prev_index(0), 4);
    assert_eq!(ring.prev_index(3), 2);
}

#[test]
fn test_advance_over_a_free_slot() {
    let mut ring = MonitorRing::new(3, Instant::now());
    assert_eq!(ring.current_index(), 0);
    assert!(!ring.advance());
    assert_eq!(ring.current_index(), 1);
}

#[test]
fn test_advance_evicts_a_live_slot() {
    let mut ring = MonitorRing::new(3, Instant::now());
    ring.get_mut(1).valid = true;

    assert!(ring.advance());
    assert_eq!(ring.current_index(), 1);
    // The stale measurement is gone; the slot is reusable.
    assert!(!ring.get(1).valid);
}

#[test]
fn test_advance_wraps_to_the_first_slot() {
    let mut ring = MonitorRing::new(2, Instant::now());
    ring.advance();
    assert_eq!(ring.current_index(), 1);
    ring.advance();
    assert_eq!(ring.current_index(), 0);
}
