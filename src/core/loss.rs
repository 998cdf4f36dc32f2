//! 丢包核算 - 将累积确认与选择性确认归并到每个区间
//! Loss accounting - reconciles cumulative and selective acks per interval
//!
//! 职责：
//! - 用累积确认游标推进每个在途区间的覆盖
//! - 把选择性确认范围之下的空洞归因为该区间的丢失字节
//! - 保证重复投喂同一份确认数据不会重复计数
//!
//! Idempotency falls out of the bookkeeping: a range's loss contribution is
//! always measured from the interval's current `last_acked_seq`, and that
//! cursor only ever moves forward. Feeding the same ranges again finds no
//! hole left to attribute.

use tracing::{debug, trace};

use crate::event::sack::{sorted_for_accounting, SackRange};

use super::monitor::MonitorRing;

/// Summary of one acknowledgment pass over the ring.
///
/// 对环做一遍确认处理的汇总。
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LossSummary {
    /// Bytes newly attributed as lost across all intervals.
    /// 本次在所有区间上新归因的丢失字节数。
    pub bytes_lost_delta: u64,
}

/// Applies one acknowledgment event to every tracked interval.
///
/// 将一次确认事件应用到每个被跟踪的区间。
pub(crate) fn apply_ack(
    ring: &mut MonitorRing,
    cumulative_ack: u64,
    sack_blocks: &[SackRange],
) -> LossSummary {
    let blocks = sorted_for_accounting(sack_blocks);
    let mut summary = LossSummary::default();

    for index in 0..ring.capacity() {
        let interval = ring.get_mut(index);
        if !interval.valid {
            continue;
        }

        // The cumulative cursor covers everything below it.
        if cumulative_ack > interval.last_acked_seq {
            interval.last_acked_seq = cumulative_ack;
        }

        for block in &blocks {
            // Nothing left unaccounted in this interval.
            if interval.last_acked_seq >= interval.end_seq {
                continue;
            }

            if block.start > interval.last_acked_seq {
                // The hole below this block, clipped to the interval.
                let lost = if block.start < interval.end_seq {
                    block.start - interval.last_acked_seq
                } else {
                    interval.end_seq - interval.last_acked_seq
                };
                interval.bytes_lost += lost;
                summary.bytes_lost_delta += lost;
                trace!(
                    index,
                    block_start = block.start,
                    block_end = block.end,
                    last_acked = interval.last_acked_seq,
                    lost,
                    "hole below selective ack attributed as loss"
                );
            }

            if block.end > interval.last_acked_seq {
                interval.last_acked_seq = block.end;
            }
        }
    }

    if summary.bytes_lost_delta > 0 {
        debug!(
            cumulative_ack,
            bytes_lost = summary.bytes_lost_delta,
            "acknowledgment pass attributed loss"
        );
    }

    summary
}
