//! An estimator for the round-trip time (RTT).
//! RTT 估算器。

use std::time::Duration;

const ALPHA: f64 = 1.0 / 8.0;
const BETA: f64 = 1.0 / 4.0;

/// An estimator for the round-trip time (RTT), based on RFC 6298.
///
/// The smoothed RTT sizes monitor-interval windows; an interval needs to be
/// long enough for a round trip's worth of feedback to be meaningful.
///
/// 一个基于 RFC 6298 的 RTT 估算器。平滑RTT用于确定监测区间窗口的长度；
/// 区间必须足够长，一个往返的反馈才有意义。
#[derive(Debug, Clone)]
pub(crate) struct RttEstimator {
    /// The smoothed round-trip time, in seconds.
    /// 平滑的往返时间（秒）。
    srtt: f64,
    /// The round-trip time variation, in seconds.
    /// 往返时间变化量（秒）。
    rttvar: f64,
}

impl RttEstimator {
    /// Creates an estimator that has seen no samples yet.
    ///
    /// 创建一个尚未见过任何样本的估算器。
    pub(crate) fn new() -> Self {
        Self {
            srtt: 0.0,
            rttvar: 0.0,
        }
    }

    /// Returns the smoothed RTT, or `None` before the first sample.
    ///
    /// 返回平滑RTT；在第一个样本之前返回 `None`。
    pub(crate) fn smoothed_rtt(&self) -> Option<Duration> {
        if self.srtt == 0.0 {
            None
        } else {
            Some(Duration::from_secs_f64(self.srtt))
        }
    }

    /// Updates the estimator with a new sample.
    ///
    /// 使用一个新的样本更新估算器。
    pub(crate) fn update(&mut self, rtt_sample: Duration) {
        let rtt_sample_f64 = rtt_sample.as_secs_f64();

        if self.srtt == 0.0 {
            // First sample
            self.srtt = rtt_sample_f64;
            self.rttvar = rtt_sample_f64 / 2.0;
        } else {
            // Subsequent samples using RFC 6298 formulas
            let delta = (self.srtt - rtt_sample_f64).abs();
            self.rttvar = (1.0 - BETA) * self.rttvar + BETA * delta;
            self.srtt = (1.0 - ALPHA) * self.srtt + ALPHA * rtt_sample_f64;
        }
    }
}
