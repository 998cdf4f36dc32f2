//! 定义了SACK（选择性确认）相关的数据结构和逻辑。
//! Defines data structures and logic related to SACK (Selective Acknowledgment).

use std::ops::Range;

/// The maximum number of selective-acknowledgment ranges consulted per
/// acknowledgment event. Additional ranges are ignored.
/// 每次确认事件最多使用的选择性确认范围数量。多余的范围会被忽略。
pub const MAX_SACK_BLOCKS: usize = 4;

/// Represents a continuous range of acknowledged byte sequence numbers.
/// 代表一个连续的已确认字节序号范围。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SackRange {
    /// The start of the acknowledged range (inclusive).
    /// 确认范围的起始（包含）。
    pub start: u64,
    /// The end of the acknowledged range (exclusive).
    /// 确认范围的结束（不包含）。
    pub end: u64,
}

impl SackRange {
    /// A range that covers no bytes carries no information.
    /// 不覆盖任何字节的范围不携带信息。
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

impl From<Range<u64>> for SackRange {
    fn from(range: Range<u64>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

/// Prepares raw selective-acknowledgment ranges for loss accounting: drops
/// degenerate entries, keeps at most [`MAX_SACK_BLOCKS`], and sorts the
/// survivors ascending by start sequence. Loss attribution walks the holes
/// below each range and is only correct over an ascending sequence.
///
/// 为丢包核算准备原始的选择性确认范围：丢弃退化条目，最多保留
/// [`MAX_SACK_BLOCKS`] 个，并将剩余条目按起始序号升序排序。
/// 丢包归因沿每个范围之下的空洞进行，只有在升序序列上才是正确的。
pub(crate) fn sorted_for_accounting(blocks: &[SackRange]) -> Vec<SackRange> {
    let mut prepared: Vec<SackRange> = blocks
        .iter()
        .filter(|block| !block.is_empty())
        .take(MAX_SACK_BLOCKS)
        .cloned()
        .collect();
    prepared.sort_by_key(|block| block.start);
    prepared
}
