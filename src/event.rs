//! 定义了控制器消费的每事件输入。
//! Defines the per-event inputs consumed by the controller.
//!
//! The host transport owns the wire: it parses acknowledgment frames,
//! tracks the send cursor and samples round-trip times. The controller only
//! ever sees the already-decoded reports in this module.
//!
//! 宿主传输层拥有线路：由它解析确认帧、跟踪发送游标并采样往返时间。
//! 控制器只会看到本模块中已经解码好的报告。

use std::time::Duration;

pub mod sack;

use self::sack::SackRange;

/// A report describing data handed to the network since the last report.
///
/// 描述自上次报告以来交给网络的数据的报告。
#[derive(Debug, Clone)]
pub struct TransmitReport {
    /// The first byte sequence not yet transmitted, after this transmission.
    /// 本次发送之后尚未发送的第一个字节序号。
    pub send_cursor: u64,

    /// The number of segments transmitted since the previous report.
    /// 自上一份报告以来发送的段数。
    pub segments_delta: u64,
}

/// A report describing one acknowledgment arrival.
///
/// 描述一次确认到达的报告。
#[derive(Debug, Clone)]
pub struct AckReport<'a> {
    /// A fresh round-trip-time sample, when the acknowledgment produced one.
    /// 本次确认产生的新往返时间样本（如果有）。
    pub rtt_sample: Option<Duration>,

    /// The cumulative acknowledgment cursor: every byte below it has been
    /// delivered.
    /// 累积确认游标：其下的每个字节都已送达。
    pub cumulative_ack: u64,

    /// Selectively acknowledged ranges above the cumulative cursor. Only
    /// the first [`sack::MAX_SACK_BLOCKS`] ranges are consulted.
    /// 累积游标之上被选择性确认的范围。最多只会使用前
    /// [`sack::MAX_SACK_BLOCKS`] 个范围。
    pub sack_blocks: &'a [SackRange],
}
