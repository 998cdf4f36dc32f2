//! 效用计算器 - 为一个已结束的监测区间打分
//! Utility calculator - scores one finished monitor interval
//!
//! 职责：
//! - 把区间测量值换算成吞吐与丢包的标量效用
//! - 推导区间的实际发送速率
//! - 标记测量异常（从不中断连接）
//!
//! The score trades goodput against loss through a steep logistic gate
//! centered at 5% loss: below the gate the throughput term passes almost
//! unpenalized, above it the utility collapses. This produces a sharp "stop
//! probing upward" signal instead of a smooth linear tradeoff.

pub(crate) mod fixed;

use tracing::warn;

use self::fixed::Fixed;

/// Microseconds per second, as a fixed-point divisor.
const MICROS_PER_SEC: i64 = 1_000_000;

/// Center of the logistic loss gate: 0.05 in Q32.32.
const LOSS_GATE_CENTER: Fixed = Fixed::from_raw(214_748_365);

/// Steepness of the logistic loss gate.
const LOSS_GATE_STEEPNESS: i64 = 100;

/// The raw measurements of one finished interval.
///
/// 一个已结束区间的原始测量值。
#[derive(Debug, Clone, Copy)]
pub(crate) struct Measurement {
    /// Bytes handed to the network during the interval.
    /// 区间内交给网络的字节数。
    pub bytes_sent: u64,
    /// Bytes attributed as lost by the loss accountant.
    /// 丢包核算归因为丢失的字节数。
    pub bytes_lost: u64,
    /// Observed window length in microseconds.
    /// 观测到的窗口长度（微秒）。
    pub window_us: u64,
    /// The rate the interval was commanded to send at, bytes per second.
    /// 区间被指示的发送速率（字节每秒）。
    pub target_rate: u64,
}

/// One interval's score.
///
/// 单个区间的评分。
#[derive(Debug, Clone, Copy)]
pub(crate) struct IntervalScore {
    /// The signed utility value, comparable across intervals.
    /// 带符号的效用值，可在区间之间比较。
    pub utility: Fixed,
    /// The rate actually achieved, bytes per second.
    /// 实际达到的速率（字节每秒）。
    pub actual_rate: u64,
}

/// Measurement anomalies observed while scoring. All are non-fatal; the
/// controller only counts them.
///
/// 评分过程中观测到的测量异常。全部为非致命，控制器只做计数。
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct AnomalyFlags {
    /// The window came in as zero microseconds and was floored to one.
    /// 窗口长度为零微秒，被下限到一微秒。
    pub zero_window: bool,
    /// More bytes were attributed as lost than were ever sent.
    /// 被归因为丢失的字节数超过了发送总量。
    pub lost_exceeds_sent: bool,
    /// The achieved rate exceeded the commanded rate.
    /// 实际速率超过了指示速率。
    pub rate_overshoot: bool,
}

/// The outcome of scoring one interval. A `None` score means the interval
/// is unmeasured and must be excluded from decisions.
///
/// 单个区间的评分结果。`None` 表示该区间未能测量，必须被排除在决策之外。
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScoreResult {
    pub score: Option<IntervalScore>,
    pub flags: AnomalyFlags,
}

/// Scores one finished interval.
///
/// `utility = goodput/sec × penalty(lossRatio) − lost/sec`, with
/// `penalty(r) = 1 − 1/(1 + exp(−100 × (r − 0.05)))`. All arithmetic is
/// Q32.32 fixed point so the score is identical on every platform.
///
/// 为一个已结束的区间打分。全部运算使用 Q32.32 定点数，
/// 保证评分在所有平台上一致。
pub(crate) fn score(measurement: &Measurement) -> ScoreResult {
    let mut flags = AnomalyFlags::default();

    let window_us = if measurement.window_us == 0 {
        warn!("scoring an interval whose window never advanced");
        flags.zero_window = true;
        1
    } else {
        measurement.window_us
    };

    if measurement.bytes_sent == 0 {
        return ScoreResult { score: None, flags };
    }

    if measurement.bytes_lost > measurement.bytes_sent {
        warn!(
            bytes_sent = measurement.bytes_sent,
            bytes_lost = measurement.bytes_lost,
            "loss accounting exceeds bytes sent"
        );
        flags.lost_exceeds_sent = true;
        return ScoreResult { score: None, flags };
    }

    let sent = measurement.bytes_sent as i64;
    let lost = measurement.bytes_lost as i64;
    let elapsed_sec = Fixed::from_ratio(window_us as i64, MICROS_PER_SEC);

    let actual_rate_fx =
        Fixed::from_ratio(sent, window_us as i64) * Fixed::from_int(MICROS_PER_SEC);
    let actual_rate = actual_rate_fx.to_int().max(0) as u64;
    if actual_rate > measurement.target_rate {
        warn!(
            actual_rate,
            target_rate = measurement.target_rate,
            "interval outpaced its commanded rate"
        );
        flags.rate_overshoot = true;
    }

    let loss_ratio = Fixed::from_ratio(lost, sent);
    let gate_arg =
        Fixed::from_int(-LOSS_GATE_STEEPNESS) * (loss_ratio - LOSS_GATE_CENTER);
    let penalty = Fixed::ONE - Fixed::ONE / (Fixed::ONE + gate_arg.exp());

    let goodput = Fixed::from_int(sent - lost) / elapsed_sec;
    let loss_rate = Fixed::from_int(lost) / elapsed_sec;
    let utility = goodput * penalty - loss_rate;

    ScoreResult {
        score: Some(IntervalScore {
            utility,
            actual_rate,
        }),
        flags,
    }
}
