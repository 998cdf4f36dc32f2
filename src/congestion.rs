//! Defines the pluggable congestion control interface.
//! 定义了可插拔的拥塞控制接口。

use std::time::Instant;

use crate::event::{AckReport, TransmitReport};

/// A trait for congestion control algorithms that steer a pacing rate.
///
/// Implementations are driven synchronously by the host transport: once per
/// transmit and once per acknowledgment, under whatever per-connection
/// serialization the host already provides. The published rate is the sole
/// throttling signal; the congestion window is reported as an effectively
/// unbounded value so window backpressure never engages.
///
/// 以发送速率为目标的拥塞控制算法 trait。
///
/// 实现由宿主传输层同步驱动：每次发送与每次确认各调用一次，
/// 复用宿主已有的按连接串行化。发布的速率是唯一的节流信号；
/// 拥塞窗口报告为一个等效无限大的值，使窗口反压永远不会生效。
pub trait CongestionControl: Send + Sync + 'static {
    /// Called after data has been handed to the network.
    ///
    /// 在数据交给网络之后调用。
    fn on_transmit(&mut self, now: Instant, report: &TransmitReport);

    /// Called when an acknowledgment arrives.
    ///
    /// 当一个确认到达时调用。
    fn on_ack(&mut self, now: Instant, report: &AckReport<'_>);

    /// Gets the pacing rate currently in force, in bytes per second.
    ///
    /// 获取当前生效的发送速率（字节每秒）。
    fn pacing_rate(&self) -> u64;

    /// Gets the congestion window size in packets. Rate-based controllers
    /// return a value large enough to never constrain the sender.
    ///
    /// 获取当前的拥塞窗口大小（以包为单位）。基于速率的控制器返回一个
    /// 足够大的值，从而永远不会约束发送方。
    fn congestion_window(&self) -> u32;

    /// The short name of the algorithm.
    ///
    /// 算法的简称。
    fn name(&self) -> &'static str;
}
