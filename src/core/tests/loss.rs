//! Tests for the loss accountant.
use std::time::Instant;

use crate::core::loss::apply_ack;
use crate::core::monitor::{IntervalStage, MonitorRing};
use crate::event::sack::SackRange;

/// Builds a ring whose slot `index` tracks the byte range `[start, end)`.
fn track(ring: &mut MonitorRing, index: usize, start: u64, end: u64) {
    let interval = ring.get_mut(index);
    interval.valid = true;
    interval.stage = IntervalStage::AwaitingAcks;
    interval.start_seq = start;
    interval.end_seq = end;
    interval.last_acked_seq = start;
}

#[test]
fn test_cumulative_ack_raises_coverage() {
    let mut ring = MonitorRing::new(4, Instant::now());
    track(&mut ring, 0, 0, 10_000);
    track(&mut ring, 1, 10_000, 20_000);

    apply_ack(&mut ring, 15_000, &[]);

    // The cursor covers slot 0 entirely and half of slot 1.
    assert_eq!(ring.get(0).last_acked_seq, 15_000);
    assert_eq!(ring.get(1).last_acked_seq, 15_000);
    assert_eq!(ring.get(0).bytes_lost, 0);
}

#[test]
fn test_cumulative_ack_never_regresses() {
    let mut ring = MonitorRing::new(4, Instant::now());
    track(&mut ring, 0, 0, 10_000);

    apply_ack(&mut ring, 8_000, &[]);
    apply_ack(&mut ring, 5_000, &[]);

    assert_eq!(ring.get(0).last_acked_seq, 8_000);
}

#[test]
fn test_hole_below_selective_ack_becomes_loss() {
    let mut ring = MonitorRing::new(4, Instant::now());
    track(&mut ring, 0, 0, 10_000);
    apply_ack(&mut ring, 2_000, &[]);

    let summary = apply_ack(&mut ring, 2_000, &[SackRange::from(4_000..5_000)]);

    // [2000, 4000) was skipped over.
    assert_eq!(summary.bytes_lost_delta, 2_000);
    assert_eq!(ring.get(0).bytes_lost, 2_000);
    assert_eq!(ring.get(0).last_acked_seq, 5_000);
}

#[test]
fn test_reprocessing_the_same_block_adds_nothing() {
    let mut ring = MonitorRing::new(4, Instant::now());
    track(&mut ring, 0, 0, 10_000);
    apply_ack(&mut ring, 2_000, &[]);

    let block = [SackRange::from(4_000..5_000)];
    apply_ack(&mut ring, 2_000, &block);
    let again = apply_ack(&mut ring, 2_000, &block);

    assert_eq!(again.bytes_lost_delta, 0);
    assert_eq!(ring.get(0).bytes_lost, 2_000);
    assert_eq!(ring.get(0).last_acked_seq, 5_000);
}

#[test]
fn test_block_past_the_interval_clips_to_its_end() {
    let mut ring = MonitorRing::new(4, Instant::now());
    track(&mut ring, 0, 0, 10_000);
    apply_ack(&mut ring, 2_000, &[]);

    let summary = apply_ack(&mut ring, 2_000, &[SackRange::from(12_000..13_000)]);

    // Everything from the cursor to the interval's end was skipped.
    assert_eq!(summary.bytes_lost_delta, 8_000);
    assert_eq!(ring.get(0).bytes_lost, 8_000);
    // Coverage still advances past the interval.
    assert_eq!(ring.get(0).last_acked_seq, 13_000);
}

#[test]
fn test_blocks_are_sorted_before_attribution() {
    let mut ring = MonitorRing::new(4, Instant::now());
    track(&mut ring, 0, 0, 10_000);
    apply_ack(&mut ring, 2_000, &[]);

    // Delivered out of order; ascending processing attributes the two holes
    // [2000,3000) and [4000,6000) separately.
    let summary = apply_ack(
        &mut ring,
        2_000,
        &[SackRange::from(6_000..7_000), SackRange::from(3_000..4_000)],
    );

    assert_eq!(summary.bytes_lost_delta, 3_000);
    assert_eq!(ring.get(0).last_acked_seq, 7_000);
}

#[test]
fn test_degenerate_blocks_are_ignored() {
    let mut ring = MonitorRing::new(4, Instant::now());
    track(&mut ring, 0, 0, 10_000);
    apply_ack(&mut ring, 2_000, &[]);

    let summary = apply_ack(&mut ring, 2_000, &[SackRange::from(5_000..5_000)]);

    assert_eq!(summary.bytes_lost_delta, 0);
    assert_eq!(ring.get(0).last_acked_seq, 2_000);
}

#[test]
fn test_only_four_blocks_are_consulted() {
    let mut ring = MonitorRing::new(4, Instant::now());
    track(&mut ring, 0, 0, 100_000);
    apply_ack(&mut ring, 10_000, &[]);

    let blocks = [
        SackRange::from(20_000..21_000),
        SackRange::from(30_000..31_000),
        SackRange::from(40_000..41_000),
        SackRange::from(50_000..51_000),
        SackRange::from(60_000..61_000),
    ];
    apply_ack(&mut ring, 10_000, &blocks);

    // The fifth block is ignored: coverage stops at the fourth.
    assert_eq!(ring.get(0).last_acked_seq, 51_000);
}

#[test]
fn test_holes_split_across_intervals() {
    let mut ring = MonitorRing::new(4, Instant::now());
    track(&mut ring, 0, 0, 10_000);
    track(&mut ring, 1, 10_000, 20_000);

    // A block above both cursors: slot 0 loses its remaining span, slot 1
    // loses the hole up to the block start.
    let summary = apply_ack(&mut ring, 0, &[SackRange::from(12_000..14_000)]);

    assert_eq!(ring.get(0).bytes_lost, 10_000);
    assert_eq!(ring.get(1).bytes_lost, 2_000);
    assert_eq!(summary.bytes_lost_delta, 12_000);
    assert_eq!(ring.get(0).last_acked_seq, 14_000);
    assert_eq!(ring.get(1).last_acked_seq, 14_000);
}
