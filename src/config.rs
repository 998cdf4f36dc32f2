//! 定义了速率控制器的可配置参数。
//! Defines configurable parameters for the rate controller.

use std::time::Duration;

use crate::error::{Error, Result};

/// A structure containing all configurable parameters for one controller.
///
/// 包含单个控制器所有可配置参数的结构体。
#[derive(Debug, Clone)]
pub struct Config {
    /// Pacing-rate related parameters.
    /// 发送速率相关参数。
    pub pacing: PacingConfig,

    /// Monitor-interval related parameters.
    /// 监测区间相关参数。
    pub monitor: MonitorConfig,

    /// Rate-probing and adjustment parameters.
    /// 速率探测与调整相关参数。
    pub probing: ProbingConfig,
}

/// Pacing-rate related parameters.
///
/// 发送速率相关参数。
#[derive(Debug, Clone)]
pub struct PacingConfig {
    /// The rate, in bytes per second, that the very first monitor interval
    /// is seeded from.
    /// 第一个监测区间的种子速率（字节每秒）。
    pub initial_rate: u64,

    /// The floor applied to every published rate. No decision can push the
    /// pacing rate below this value.
    /// 应用于每个发布速率的下限。任何决策都不能把发送速率压到该值以下。
    pub minimum_rate: u64,
}

/// Monitor-interval related parameters.
///
/// 监测区间相关参数。
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// The number of interval slots kept per connection. Intervals still
    /// awaiting acknowledgments occupy a slot until they end.
    /// 每个连接保留的区间槽位数量。尚在等待确认的区间会一直占用槽位直到结束。
    pub interval_capacity: usize,

    /// The minimum number of segments an interval must carry before its
    /// sending phase is allowed to close. Short, noise-dominated
    /// measurements are avoided by extending the window instead.
    /// 区间的发送阶段被允许关闭之前必须承载的最少段数。
    /// 通过延长窗口来避免过短的、被噪声主导的测量。
    pub min_segments_per_interval: u64,

    /// The increment by which an under-filled interval's window is extended
    /// when its nominal duration has already elapsed.
    /// 当名义时长已过而数据量不足时，区间窗口每次延长的增量。
    pub window_extend_increment: Duration,

    /// The interval window is `smoothed_rtt` multiplied by this factor.
    /// 区间窗口等于 `smoothed_rtt` 乘以该因子。
    pub rtt_window_factor: f64,

    /// The window used before any RTT sample has been observed.
    /// 在观测到任何RTT样本之前使用的窗口时长。
    pub initial_interval: Duration,

    /// The payload size of one segment, in bytes. Used to convert the
    /// per-interval segment counter into bytes sent.
    /// 单个段的载荷大小（字节）。用于把区间内的段计数换算成已发送字节数。
    pub segment_size: u64,
}

/// Rate-probing and adjustment parameters.
///
/// 速率探测与调整相关参数。
#[derive(Debug, Clone)]
pub struct ProbingConfig {
    /// The probe perturbation, in percent of the base rate, applied per
    /// probing attempt. The effective step grows linearly with the number
    /// of inconclusive probe rounds.
    /// 每次探测尝试施加的扰动，以基准速率的百分比表示。
    /// 有效步长随未能得出结论的探测轮数线性增长。
    pub probe_step_percent: u64,

    /// The adjustment step, in percent of the base rate, applied per
    /// interval while ramping the rate in a decided direction.
    /// 在已定方向上逐区间调整速率时施加的步长，以基准速率的百分比表示。
    pub adjustment_step_percent: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pacing: PacingConfig::default(),
            monitor: MonitorConfig::default(),
            probing: ProbingConfig::default(),
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            initial_rate: 1_000_000,
            minimum_rate: 800_000,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_capacity: 30,
            min_segments_per_interval: 20,
            window_extend_increment: Duration::from_micros(50),
            rtt_window_factor: 4.0 / 3.0,
            initial_interval: Duration::from_millis(10),
            segment_size: 1200,
        }
    }
}

impl Default for ProbingConfig {
    fn default() -> Self {
        Self {
            probe_step_percent: 1,
            adjustment_step_percent: 1,
        }
    }
}

impl Config {
    /// Checks the configuration for values the controller cannot operate on.
    ///
    /// 检查控制器无法使用的配置值。
    pub fn validate(&self) -> Result<()> {
        if self.monitor.interval_capacity == 0 {
            return Err(Error::ZeroIntervalCapacity);
        }
        if self.monitor.segment_size == 0 {
            return Err(Error::ZeroSegmentSize);
        }
        if self.pacing.minimum_rate == 0 {
            return Err(Error::ZeroMinimumRate);
        }
        if self.pacing.minimum_rate > self.pacing.initial_rate {
            return Err(Error::RateFloorAboveInitial {
                minimum: self.pacing.minimum_rate,
                initial: self.pacing.initial_rate,
            });
        }
        if !self.monitor.rtt_window_factor.is_finite() || self.monitor.rtt_window_factor <= 0.0 {
            return Err(Error::InvalidRttWindowFactor);
        }
        Ok(())
    }
}
