//! 控制器 - 监测区间生命周期与速率发布的编排者
//! The controller - orchestrates interval lifecycles and rate publication
//!
//! One `Pcc` exists per connection. Every transmit and every acknowledgment
//! event flows through it synchronously; after each event the host reads
//! back the pacing rate of the interval currently sending. The controller
//! never blocks and every handler is O(ring capacity).
//!
//! 每个连接持有一个 `Pcc`。每次发送与确认事件都同步流经它；
//! 每个事件之后宿主读取当前发送区间的速率。控制器从不阻塞，
//! 每个处理函数的开销都是 O(环容量)。

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::config::Config;
use crate::congestion::CongestionControl;
use crate::error::Result;
use crate::event::{AckReport, TransmitReport};

use super::decision::{DecisionEngine, Phase, ProbeSnapshot};
use super::loss;
use super::monitor::{IntervalStage, MonitorRing, ProbeRole};
use super::rtt::RttEstimator;
use super::utility::{self, Measurement};

/// The congestion window reported to the host: large enough that window
/// backpressure never engages and the pacing rate is the sole throttle.
/// 报告给宿主的拥塞窗口：大到窗口反压永远不会生效，
/// 发送速率因此成为唯一的节流手段。
pub(crate) const UNLIMITED_WINDOW: u32 = 20_000_000;

/// Completed intervals required before a utility regression is trusted.
/// 在信任一次效用回退之前需要完成的区间数量。
const REGRESSION_WARMUP_INTERVALS: u64 = 3;

/// Anomaly counters. Nothing in here is fatal; the counters exist so that
/// degradation is observable instead of silent.
///
/// 异常计数器。其中没有任何致命项；计数器的存在使退化可被观测而非无声发生。
#[derive(Debug, Default, Clone)]
pub struct ControllerStats {
    /// Intervals that reached a graceful end.
    /// 优雅结束的区间数。
    pub intervals_completed: u64,
    /// Interval measurements sacrificed to ring wraparound.
    /// 因环回绕而被牺牲的区间测量数。
    pub slots_evicted: u64,
    /// Intervals that ended without a usable measurement.
    /// 结束时没有可用测量的区间数。
    pub unmeasured_intervals: u64,
    /// Intervals whose attributed loss exceeded their bytes sent.
    /// 归因丢失超过发送字节数的区间数。
    pub loss_exceeded_sent: u64,
    /// Intervals whose window never advanced past zero.
    /// 窗口从未超过零的区间数。
    pub zero_length_windows: u64,
    /// Intervals that outpaced their commanded rate.
    /// 超过指示速率发送的区间数。
    pub rate_overshoots: u64,
    /// Rate-adjustment steps discarded after wrapping around.
    /// 因回绕而被丢弃的速率调整步数。
    pub adjustment_sign_inversions: u64,
}

/// A point-in-time view of the controller, for diagnostics and tests.
///
/// 控制器的瞬时视图，用于诊断与测试。
#[derive(Debug, Clone)]
pub struct ControllerSnapshot {
    /// The current decision phase.
    /// 当前的决策阶段。
    pub phase: Phase,
    /// The rate new intervals are seeded from.
    /// 新区间的种子速率。
    pub base_rate: u64,
    /// The direction of the adjustment ramp: +1 raising, -1 lowering.
    /// 调整坡道的方向：+1 为升速，-1 为降速。
    pub direction: i8,
    /// The rate currently published.
    /// 当前发布的速率。
    pub pacing_rate: u64,
    /// Slots currently tracked (sending or awaiting acks).
    /// 当前被跟踪的槽位数（发送中或等待确认）。
    pub tracked_intervals: usize,
    /// Slots currently in the sending stage. Always exactly one.
    /// 当前处于发送阶段的槽位数。恒为一。
    pub sending_intervals: usize,
}

/// A goal-oriented pacing-rate controller.
///
/// Rather than reacting to individual loss events, it tests target rates
/// over short monitor intervals, scores each with a utility trading
/// throughput against loss, and steers a persistent base rate from the
/// comparisons.
///
/// 面向目标的发送速率控制器。它不对单次丢包做出反应，而是在短的监测区间上
/// 测试目标速率，用权衡吞吐与丢包的效用为每个区间打分，
/// 并根据比较结果调整持久的基准速率。
pub struct Pcc {
    config: Config,
    ring: MonitorRing,
    engine: DecisionEngine,
    rtt: RttEstimator,
    last_rtt: Option<Duration>,
    /// Image of the host's send cursor: the next byte sequence to transmit.
    /// 宿主发送游标的镜像：下一个要发送的字节序号。
    send_cursor: u64,
    /// Gracefully-ended intervals over the connection's lifetime.
    /// 连接生命周期内优雅结束的区间总数。
    intervals_ended: u64,
    stats: ControllerStats,
}

impl Pcc {
    /// Creates a controller and opens its first monitor interval.
    ///
    /// 创建控制器并开启它的第一个监测区间。
    pub fn new(config: Config, now: Instant) -> Result<Self> {
        config.validate()?;

        let engine = DecisionEngine::new(
            config.probing.clone(),
            config.pacing.initial_rate,
            config.pacing.minimum_rate,
        );
        let ring = MonitorRing::new(config.monitor.interval_capacity, now);

        let mut controller = Self {
            config,
            ring,
            engine,
            rtt: RttEstimator::new(),
            last_rtt: None,
            send_cursor: 0,
            intervals_ended: 0,
            stats: ControllerStats::default(),
        };
        controller.open_current(now);
        Ok(controller)
    }

    /// The window length for a freshly opened interval.
    /// 新开启区间的窗口长度。
    fn next_window_us(&self) -> u64 {
        match self.rtt.smoothed_rtt() {
            Some(srtt) => {
                srtt.mul_f64(self.config.monitor.rtt_window_factor)
                    .as_micros() as u64
            }
            None => self.config.monitor.initial_interval.as_micros() as u64,
        }
    }

    /// Opens the current slot: seeds the record, asks the decision engine
    /// for the target rate and role, and only then marks the slot valid.
    ///
    /// 开启当前槽位：重置记录，向决策引擎索取目标速率与角色，
    /// 之后才将槽位标记为有效。
    fn open_current(&mut self, now: Instant) {
        let window_us = self.next_window_us();
        let phase = self.engine.phase;
        let last_rtt = self.last_rtt;
        let send_cursor = self.send_cursor;

        let interval = self.ring.current_mut();
        interval.reseed(now, send_cursor, window_us, phase, last_rtt);

        let seed = self.engine.seed_interval();
        if seed.sign_inversion {
            self.stats.adjustment_sign_inversions += 1;
        }

        let interval = self.ring.current_mut();
        interval.target_rate = seed.target_rate;
        interval.role = seed.role;
        interval.valid = true;

        trace!(
            index = self.ring.current_index(),
            rate = seed.target_rate,
            ?phase,
            window_us,
            rtt = ?last_rtt,
            "opened monitor interval"
        );
    }

    /// Closes the sending phase of the current interval when both the data
    /// threshold and the window have been crossed; extends the window while
    /// the interval is under-filled so jitter cannot produce noise-length
    /// measurements. Then reaps gracefully-ended intervals and reopens.
    ///
    /// 当数据门限与窗口都已越过时关闭当前区间的发送阶段；
    /// 数据量不足时延长窗口，使抖动不会产生噪声级长度的测量。
    /// 之后回收优雅结束的区间并重新开启当前槽位。
    fn tick(&mut self, now: Instant) {
        let extend_us = self
            .config
            .monitor
            .window_extend_increment
            .as_micros()
            .max(1) as u64;
        let min_segments = self.config.monitor.min_segments_per_interval;

        let current_index = self.ring.current_index();
        let interval = self.ring.current_mut();
        let elapsed_us = interval.elapsed_us(now);

        if interval.segments_sent < min_segments {
            while elapsed_us > interval.window_us {
                interval.window_us += extend_us;
            }
        } else if interval.has_sent_data() && elapsed_us > interval.window_us {
            interval.window_us = elapsed_us;
            interval.stage = IntervalStage::AwaitingAcks;
            debug!(
                index = current_index,
                elapsed_us,
                segments = interval.segments_sent,
                "monitor interval finished sending"
            );
            if self.ring.advance() {
                self.stats.slots_evicted += 1;
            }
        }

        // Reap every interval whose data is now fully accounted for.
        for index in 0..self.ring.capacity() {
            let interval = self.ring.get(index);
            if interval.valid
                && interval.stage == IntervalStage::AwaitingAcks
                && interval.has_sent_data()
                && interval.fully_acked()
            {
                self.on_interval_end(index);
                self.ring.get_mut(index).valid = false;
            }
        }

        if !self.ring.current().valid {
            self.open_current(now);
            debug!(
                rate = self.ring.current().target_rate,
                "published pacing rate"
            );
        }
    }

    /// Handles one gracefully-ended interval: scores it, runs the utility
    /// regression check, and feeds the probing machinery.
    ///
    /// 处理一个优雅结束的区间：为其评分，执行效用回退检查，
    /// 并驱动探测机制。
    fn on_interval_end(&mut self, index: usize) {
        self.intervals_ended += 1;
        self.stats.intervals_completed += 1;

        let segment_size = self.config.monitor.segment_size;
        let interval = self.ring.get(index);
        let measurement = Measurement {
            bytes_sent: interval.bytes_sent(segment_size),
            bytes_lost: interval.bytes_lost,
            window_us: interval.window_us,
            target_rate: interval.target_rate,
        };

        let result = utility::score(&measurement);
        if result.flags.zero_window {
            self.stats.zero_length_windows += 1;
        }
        if result.flags.lost_exceeds_sent {
            self.stats.loss_exceeded_sent += 1;
        }
        if result.flags.rate_overshoot {
            self.stats.rate_overshoots += 1;
        }

        let interval = self.ring.get_mut(index);
        match result.score {
            Some(score) => {
                interval.utility = Some(score.utility);
                interval.actual_rate = score.actual_rate;
                debug!(
                    index,
                    utility = score.utility.raw(),
                    actual_rate = score.actual_rate,
                    target_rate = interval.target_rate,
                    bytes_lost = interval.bytes_lost,
                    rtt = ?interval.rtt_at_open,
                    "monitor interval ended"
                );
            }
            None => {
                self.stats.unmeasured_intervals += 1;
            }
        }

        let interval = self.ring.get(index);
        let ended_phase = interval.phase;
        let ended_role = interval.role;
        let ended_utility = interval.utility;
        let ended_rate = interval.target_rate;

        let prev = self.ring.get(self.ring.prev_index(index));

        // The very first interval of the connection has nothing to be
        // compared against.
        if ended_phase == Phase::Start && !prev.has_sent_data() {
            return;
        }

        // Utility regression: forward progress stopped paying off, so fall
        // back to probing around the last rate that worked.
        if ended_phase != Phase::WaitForDecision
            && self.intervals_ended >= REGRESSION_WARMUP_INTERVALS
            && matches!(self.engine.phase, Phase::Start | Phase::RateAdjust)
        {
            if let (Some(utility), Some(prev_utility)) = (ended_utility, prev.utility) {
                if utility < prev_utility {
                    let restore_rate = if ended_phase == Phase::Start {
                        prev.actual_rate
                    } else {
                        prev.target_rate
                    };
                    self.engine.enter_probing(restore_rate);
                }
            }
        }

        if let Some(role) = ended_role {
            if let Some(utility) = ended_utility {
                self.engine.record_probe(
                    role,
                    ProbeSnapshot {
                        utility,
                        rate: ended_rate,
                    },
                );
            }
            if role == ProbeRole::Fourth {
                self.engine.resolve_quartet();
            }
        }
    }

    /// Point-in-time diagnostics.
    /// 瞬时诊断信息。
    pub fn snapshot(&self) -> ControllerSnapshot {
        let mut tracked = 0;
        let mut sending = 0;
        for index in 0..self.ring.capacity() {
            let interval = self.ring.get(index);
            if interval.valid {
                tracked += 1;
                if interval.stage == IntervalStage::Sending {
                    sending += 1;
                }
            }
        }
        ControllerSnapshot {
            phase: self.engine.phase,
            base_rate: self.engine.base_rate,
            direction: self.engine.direction(),
            pacing_rate: self.pacing_rate(),
            tracked_intervals: tracked,
            sending_intervals: sending,
        }
    }

    /// Anomaly counters accumulated since construction.
    /// 自构造以来累积的异常计数。
    pub fn stats(&self) -> &ControllerStats {
        &self.stats
    }
}

impl CongestionControl for Pcc {
    fn on_transmit(&mut self, now: Instant, report: &TransmitReport) {
        if report.send_cursor > self.send_cursor {
            self.send_cursor = report.send_cursor;
        }

        if report.segments_delta > 0 {
            let send_cursor = self.send_cursor;
            let interval = self.ring.current_mut();
            interval.segments_sent += report.segments_delta;
            if send_cursor > interval.end_seq {
                interval.end_seq = send_cursor;
            }
            trace!(
                index = self.ring.current_index(),
                segments = report.segments_delta,
                cursor = send_cursor,
                "transmission folded into current interval"
            );
        }

        self.tick(now);
    }

    fn on_ack(&mut self, now: Instant, report: &AckReport<'_>) {
        if let Some(sample) = report.rtt_sample {
            self.last_rtt = Some(sample);
            self.rtt.update(sample);
        }

        loss::apply_ack(&mut self.ring, report.cumulative_ack, report.sack_blocks);

        self.tick(now);
    }

    fn pacing_rate(&self) -> u64 {
        self.ring.current().target_rate
    }

    fn congestion_window(&self) -> u32 {
        UNLIMITED_WINDOW
    }

    fn name(&self) -> &'static str {
        "pcc"
    }
}
