//! 决策引擎 - 探测与速率调整状态机
//! Decision engine - the probing and rate-adjustment state machine
//!
//! 职责：
//! - 为每个新开启的区间指定目标速率与探测角色
//! - 收集探测四元组的快照并做出升降裁决
//! - 在效用回退时把控制器送回探测
//!
//! The engine never touches the ring or the clock. It is fed completed
//! intervals' utilities and asked to seed each new interval, which keeps the
//! whole state machine testable without any transport plumbing.

use tracing::{debug, warn};

use crate::config::ProbingConfig;

use super::monitor::ProbeRole;
use super::utility::fixed::Fixed;

/// The controller-wide phase.
///
/// 控制器级别的阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Exponential ramp: every interval doubles the base rate.
    /// 指数爬升：每个区间都把基准速率翻倍。
    Start,
    /// First probe of the quartet (base + delta).
    /// 四元组的第一个探测（基准 + 扰动）。
    Probe1,
    /// Second probe of the quartet (base - delta).
    /// 四元组的第二个探测（基准 - 扰动）。
    Probe2,
    /// Third probe of the quartet (base + delta).
    /// 四元组的第三个探测（基准 + 扰动）。
    Probe3,
    /// Fourth probe of the quartet (base - delta).
    /// 四元组的第四个探测（基准 - 扰动）。
    Probe4,
    /// The quartet has been sent; its acknowledgments are outstanding.
    /// 四元组已发完；其确认仍未到齐。
    WaitForDecision,
    /// Ramping the rate in a decided direction, one step per interval.
    /// 在已定方向上逐区间调整速率。
    RateAdjust,
}

/// Snapshot of one completed probe interval.
///
/// 一个已完成探测区间的快照。
#[derive(Debug, Clone, Copy)]
pub(crate) struct ProbeSnapshot {
    /// The probe interval's utility.
    /// 探测区间的效用。
    pub utility: Fixed,
    /// The rate the probe interval actually tested.
    /// 探测区间实际测试的速率。
    pub rate: u64,
}

/// The verdict over one probe quartet.
///
/// 对一个探测四元组的裁决。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QuartetOutcome {
    /// Both pairs favored the raised rate.
    /// 两对都支持更高的速率。
    Raise,
    /// Both pairs favored the lowered rate.
    /// 两对都支持更低的速率。
    Lower,
    /// The pairs disagreed, or a snapshot is missing.
    /// 两对意见相左，或缺失快照。
    Inconclusive,
}

/// Judges a completed probe quartet. Pure; a missing snapshot (a probe
/// measurement lost to ring eviction) always yields `Inconclusive`.
///
/// 裁决一个已完成的探测四元组。纯函数；缺失的快照
/// （因环驱逐而丢失的探测测量）总是产生 `Inconclusive`。
pub(crate) fn judge_quartet(slots: &[Option<ProbeSnapshot>; 4]) -> QuartetOutcome {
    let [Some(first), Some(second), Some(third), Some(fourth)] = slots else {
        return QuartetOutcome::Inconclusive;
    };

    if first.utility > second.utility && third.utility > fourth.utility {
        QuartetOutcome::Raise
    } else if first.utility < second.utility && third.utility < fourth.utility {
        QuartetOutcome::Lower
    } else {
        QuartetOutcome::Inconclusive
    }
}

/// What the engine decided for a newly opened interval.
///
/// 引擎为一个新开启区间做出的决定。
#[derive(Debug, Clone, Copy)]
pub(crate) struct SeedDecision {
    /// The rate the interval must send at, already floored.
    /// 区间必须使用的发送速率，已应用下限。
    pub target_rate: u64,
    /// The probe role assigned to the interval, if any.
    /// 分配给该区间的探测角色（如果有）。
    pub role: Option<ProbeRole>,
    /// A rate-adjustment step wrapped around and was discarded.
    /// 一次速率调整步发生回绕并被丢弃。
    pub sign_inversion: bool,
}

/// The probing/adjustment state machine.
///
/// 探测与调整状态机。
#[derive(Debug)]
pub(crate) struct DecisionEngine {
    pub(crate) phase: Phase,
    /// The rate new intervals are seeded from.
    /// 新区间的种子速率。
    pub(crate) base_rate: u64,
    /// +1 while raising, -1 while lowering.
    /// 升速时为 +1，降速时为 -1。
    pub(crate) direction: i8,
    /// Adjustment intervals taken in the current direction.
    /// 当前方向上已进行的调整区间数。
    pub(crate) adjustment_tries: u64,
    /// Probe rounds attempted without a verdict; scales the probe step.
    /// 未得出裁决的探测轮数；用于放大探测步长。
    pub(crate) probe_attempt: u64,
    pub(crate) probe_slots: [Option<ProbeSnapshot>; 4],
    probing: ProbingConfig,
    minimum_rate: u64,
}

impl DecisionEngine {
    pub(crate) fn new(probing: ProbingConfig, initial_rate: u64, minimum_rate: u64) -> Self {
        Self {
            phase: Phase::Start,
            base_rate: initial_rate,
            direction: 1,
            adjustment_tries: 0,
            probe_attempt: 0,
            probe_slots: [None; 4],
            probing,
            minimum_rate,
        }
    }

    /// The perturbation applied by the current probe round.
    /// 当前探测轮施加的扰动。
    fn probe_delta(&self) -> u64 {
        (self.base_rate / 100)
            .saturating_mul(self.probe_attempt)
            .saturating_mul(self.probing.probe_step_percent)
    }

    fn floored(&self, rate: u64) -> u64 {
        rate.max(self.minimum_rate)
    }

    /// Assigns the target rate and probe role for the interval being opened,
    /// advancing the phase where the probing sequence dictates.
    ///
    /// 为正在开启的区间指定目标速率与探测角色，
    /// 并在探测序列要求时推进阶段。
    pub(crate) fn seed_interval(&mut self) -> SeedDecision {
        let mut sign_inversion = false;

        let (rate, role) = match self.phase {
            Phase::Start => {
                let rate = self.floored(self.base_rate.saturating_mul(2));
                self.base_rate = rate;
                (rate, None)
            }
            Phase::Probe1 => {
                self.phase = Phase::Probe2;
                let rate = self.floored(self.base_rate.saturating_add(self.probe_delta()));
                (rate, Some(ProbeRole::First))
            }
            Phase::Probe2 => {
                self.phase = Phase::Probe3;
                let rate = self.floored(self.base_rate.saturating_sub(self.probe_delta()));
                (rate, Some(ProbeRole::Second))
            }
            Phase::Probe3 => {
                self.phase = Phase::Probe4;
                let rate = self.floored(self.base_rate.saturating_add(self.probe_delta()));
                (rate, Some(ProbeRole::Third))
            }
            Phase::Probe4 => {
                self.phase = Phase::WaitForDecision;
                let rate = self.floored(self.base_rate.saturating_sub(self.probe_delta()));
                (rate, Some(ProbeRole::Fourth))
            }
            Phase::WaitForDecision => (self.floored(self.base_rate), None),
            Phase::RateAdjust => {
                let step = (self.base_rate / 100)
                    .wrapping_mul(self.adjustment_tries)
                    .wrapping_mul(self.probing.adjustment_step_percent);
                let candidate = if self.direction > 0 {
                    self.base_rate.wrapping_add(step)
                } else {
                    self.base_rate.wrapping_sub(step)
                };

                // A candidate on the wrong side of the base means the step
                // wrapped around the integer range.
                let inverted = (self.direction > 0 && candidate < self.base_rate)
                    || (self.direction < 0 && candidate > self.base_rate);
                let rate = if inverted {
                    warn!(
                        base_rate = self.base_rate,
                        direction = self.direction,
                        tries = self.adjustment_tries,
                        "rate adjustment wrapped; keeping the last good rate"
                    );
                    sign_inversion = true;
                    self.adjustment_tries = 1;
                    self.floored(self.base_rate)
                } else {
                    self.floored(candidate)
                };
                self.base_rate = rate;
                self.adjustment_tries += 1;
                (rate, None)
            }
        };

        SeedDecision {
            target_rate: rate,
            role,
            sign_inversion,
        }
    }

    /// Re-enters probing after a utility regression, restoring the last
    /// known-good rate as the new base.
    ///
    /// 在效用回退后重新进入探测，把最后已知的好速率恢复为新的基准。
    pub(crate) fn enter_probing(&mut self, restore_rate: u64) {
        debug!(restore_rate, "utility regressed; returning to probing");
        self.phase = Phase::Probe1;
        self.probe_attempt = 1;
        self.base_rate = restore_rate;
    }

    /// Records a completed probe interval's snapshot.
    /// 记录一个已完成探测区间的快照。
    pub(crate) fn record_probe(&mut self, role: ProbeRole, snapshot: ProbeSnapshot) {
        self.probe_slots[role.index()] = Some(snapshot);
    }

    /// Judges the quartet once its fourth interval has ended and applies
    /// the verdict. The snapshots are consumed in every branch.
    ///
    /// 在第四个区间结束后裁决四元组并应用裁决结果。
    /// 快照在每个分支中都会被消耗。
    pub(crate) fn resolve_quartet(&mut self) -> QuartetOutcome {
        let outcome = judge_quartet(&self.probe_slots);

        match outcome {
            QuartetOutcome::Raise => {
                if let Some(winner) = self.probe_slots[0] {
                    self.base_rate = winner.rate;
                }
                self.phase = Phase::RateAdjust;
                self.direction = 1;
                self.adjustment_tries = 1;
                self.probe_attempt = 0;
                debug!(base_rate = self.base_rate, "probe quartet favors raising");
            }
            QuartetOutcome::Lower => {
                if let Some(winner) = self.probe_slots[1] {
                    self.base_rate = winner.rate;
                }
                self.phase = Phase::RateAdjust;
                self.direction = -1;
                self.adjustment_tries = 1;
                self.probe_attempt = 0;
                debug!(base_rate = self.base_rate, "probe quartet favors lowering");
            }
            QuartetOutcome::Inconclusive => {
                self.probe_attempt += 1;
                self.phase = Phase::Probe1;
                debug!(
                    attempt = self.probe_attempt,
                    "probe quartet inconclusive; retrying with a larger step"
                );
            }
        }

        self.probe_slots = [None; 4];
        outcome
    }

    /// The direction of the current adjustment ramp.
    /// 当前调整坡道的方向。
    pub(crate) fn direction(&self) -> i8 {
        self.direction
    }
}
