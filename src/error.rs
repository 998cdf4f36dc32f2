//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use thiserror::Error;

/// The primary error type for the pacing-rate controller library.
///
/// Every runtime anomaly inside the controller is absorbed and counted
/// rather than surfaced; errors only exist at construction time, when a
/// configuration is rejected.
///
/// 速率控制器库的主要错误类型。控制器运行期间的所有异常都会被吸收并计数，
/// 不会向外抛出；错误只会在构造阶段因配置被拒绝而产生。
#[derive(Debug, Error)]
pub enum Error {
    /// The monitor-interval ring must be able to hold at least one interval.
    /// 监测区间环至少要能容纳一个区间。
    #[error("monitor interval capacity must be non-zero")]
    ZeroIntervalCapacity,

    /// A zero segment size would make every byte computation degenerate.
    /// 段大小为零会使所有字节计算退化。
    #[error("segment size must be non-zero")]
    ZeroSegmentSize,

    /// The rate floor is the last line of defense and must be meaningful.
    /// 速率下限是最后一道防线，必须是有意义的值。
    #[error("minimum rate must be non-zero")]
    ZeroMinimumRate,

    /// Starting below the floor would be clamped away immediately.
    /// 初始速率低于下限会在发布时立刻被钳制掉。
    #[error("minimum rate {minimum} exceeds initial rate {initial}")]
    RateFloorAboveInitial {
        /// The configured floor, in bytes per second.
        /// 配置的下限（字节每秒）。
        minimum: u64,
        /// The configured initial rate, in bytes per second.
        /// 配置的初始速率（字节每秒）。
        initial: u64,
    },

    /// The interval window is sized as `smoothed_rtt * factor`; the factor
    /// has to be a positive finite number.
    /// 区间窗口按 `smoothed_rtt * factor` 计算；该因子必须是正的有限数。
    #[error("rtt window factor must be positive and finite")]
    InvalidRttWindowFactor,
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;
