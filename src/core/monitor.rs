//! 监测区间记录与固定容量环
//! Monitor-interval records and the fixed-capacity ring
//!
//! 职责：
//! - 维护单个监测区间的测量记录
//! - 管理固定容量的区间环与当前槽位
//! - 执行槽位复用时的驱逐契约
//!
//! A monitor interval is one bounded sending window measured at one target
//! rate. Slots move through sending → awaiting-acks → ended; an ended slot
//! is vacated (`valid = false`) but its record is kept in place, because the
//! decision engine compares each finished interval against the one opened
//! immediately before it.

use std::time::{Duration, Instant};

use tracing::warn;

use super::decision::Phase;
use super::utility::fixed::Fixed;

/// Where an interval is in its lifecycle while it occupies a slot.
///
/// 区间占用槽位期间所处的生命周期阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IntervalStage {
    /// The interval is the one currently transmitting.
    /// 该区间是当前正在发送的区间。
    Sending,
    /// Transmission finished; acknowledgments are still outstanding.
    /// 发送已结束；确认仍未到齐。
    AwaitingAcks,
}

/// The position of a probe interval within the probing quartet.
///
/// 探测区间在探测四元组中的位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProbeRole {
    First,
    Second,
    Third,
    Fourth,
}

impl ProbeRole {
    /// Index into the quartet snapshot array.
    /// 在四元组快照数组中的下标。
    pub(crate) fn index(self) -> usize {
        match self {
            ProbeRole::First => 0,
            ProbeRole::Second => 1,
            ProbeRole::Third => 2,
            ProbeRole::Fourth => 3,
        }
    }
}

/// One measured sending window.
///
/// 一个被测量的发送窗口。
#[derive(Debug, Clone)]
pub(crate) struct MonitorInterval {
    /// Whether this slot is currently tracked (sending or awaiting acks).
    /// 该槽位当前是否被跟踪（发送中或等待确认）。
    pub valid: bool,

    /// Lifecycle stage while the slot is valid.
    /// 槽位有效期间的生命周期阶段。
    pub stage: IntervalStage,

    /// Probe-quartet position, when this interval is a probe.
    /// 当该区间是探测区间时，其在四元组中的位置。
    pub role: Option<ProbeRole>,

    /// The controller phase active when this interval was opened.
    /// 该区间开启时控制器所处的阶段。
    pub phase: Phase,

    /// When the interval started sending.
    /// 区间开始发送的时刻。
    pub start_time: Instant,

    /// Window length in microseconds. Extended while too little data has
    /// been sent; frozen to the observed elapsed time when sending closes.
    /// 窗口长度（微秒）。数据量不足时会被延长；发送关闭时冻结为实测时长。
    pub window_us: u64,

    /// First byte sequence belonging to this interval.
    /// 属于该区间的第一个字节序号。
    pub start_seq: u64,

    /// One past the last byte sequence transmitted in this interval.
    /// Tracks the send cursor while sending, final once sending closes.
    /// 该区间内发送的最后一个字节序号之后的位置。
    /// 发送期间跟随发送游标，发送关闭后定格。
    pub end_seq: u64,

    /// Highest sequence known delivered-or-skipped for this interval.
    /// Monotonically non-decreasing.
    /// 该区间内已知送达或被跳过的最高序号。单调不减。
    pub last_acked_seq: u64,

    /// Segments transmitted in this interval.
    /// 该区间内发送的段数。
    pub segments_sent: u64,

    /// Bytes attributed as lost to this interval.
    /// 归因到该区间的丢失字节数。
    pub bytes_lost: u64,

    /// The rate this interval was instructed to send at, bytes per second.
    /// 该区间被指示的发送速率（字节每秒）。
    pub target_rate: u64,

    /// The rate actually achieved, derived when the interval is scored.
    /// 实际达到的速率，在区间评分时推导。
    pub actual_rate: u64,

    /// The utility computed at graceful end; `None` until then, and `None`
    /// forever for an interval that could not be measured.
    /// 优雅结束时计算出的效用；在此之前为 `None`，
    /// 无法测量的区间永远为 `None`。
    pub utility: Option<Fixed>,

    /// RTT snapshot taken when the interval was opened.
    /// 区间开启时的RTT快照。
    pub rtt_at_open: Option<Duration>,
}

impl MonitorInterval {
    /// Creates an untracked slot.
    /// 创建一个未被跟踪的槽位。
    pub(crate) fn new(now: Instant) -> Self {
        Self {
            valid: false,
            stage: IntervalStage::Sending,
            role: None,
            phase: Phase::Start,
            start_time: now,
            window_us: 0,
            start_seq: 0,
            end_seq: 0,
            last_acked_seq: 0,
            segments_sent: 0,
            bytes_lost: 0,
            target_rate: 0,
            actual_rate: 0,
            utility: None,
            rtt_at_open: None,
        }
    }

    /// Re-seeds this slot for a fresh interval. The caller assigns the
    /// target rate and role afterwards and only then marks the slot valid.
    ///
    /// 为一个新区间重置该槽位。调用方随后填入目标速率与角色，
    /// 之后才将槽位标记为有效。
    pub(crate) fn reseed(
        &mut self,
        now: Instant,
        send_cursor: u64,
        window_us: u64,
        phase: Phase,
        rtt_at_open: Option<Duration>,
    ) {
        self.valid = false;
        self.stage = IntervalStage::Sending;
        self.role = None;
        self.phase = phase;
        self.start_time = now;
        self.window_us = window_us;
        self.start_seq = send_cursor;
        self.end_seq = 0;
        self.last_acked_seq = send_cursor;
        self.segments_sent = 0;
        self.bytes_lost = 0;
        self.target_rate = 0;
        self.actual_rate = 0;
        self.utility = None;
        self.rtt_at_open = rtt_at_open;
    }

    /// Whether any data has been transmitted in this interval.
    /// 该区间内是否已发送过数据。
    pub(crate) fn has_sent_data(&self) -> bool {
        self.end_seq > self.start_seq
    }

    /// Whether every transmitted byte is delivered or accounted lost.
    /// 是否每个已发送字节都已送达或被确认为丢失。
    pub(crate) fn fully_acked(&self) -> bool {
        self.last_acked_seq >= self.end_seq
    }

    /// Bytes sent, derived from the segment counter.
    /// 由段计数推导的已发送字节数。
    pub(crate) fn bytes_sent(&self, segment_size: u64) -> u64 {
        self.segments_sent.saturating_mul(segment_size)
    }

    /// Microseconds elapsed since the interval started.
    /// 自区间开始以来经过的微秒数。
    pub(crate) fn elapsed_us(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.start_time).as_micros() as u64
    }
}

/// The fixed-capacity ring of interval slots.
///
/// Slots are recycled for the lifetime of the connection. Advancing onto a
/// slot that is still valid means acknowledgments for the oldest in-flight
/// interval never caught up; that interval's measurement is sacrificed.
///
/// 固定容量的区间槽位环。槽位在连接生命周期内循环复用。
/// 前进到仍然有效的槽位意味着最老的在途区间的确认始终没有到齐；
/// 该区间的测量被牺牲。
#[derive(Debug)]
pub(crate) struct MonitorRing {
    slots: Vec<MonitorInterval>,
    current: usize,
}

impl MonitorRing {
    pub(crate) fn new(capacity: usize, now: Instant) -> Self {
        Self {
            slots: (0..capacity).map(|_| MonitorInterval::new(now)).collect(),
            current: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn current_index(&self) -> usize {
        self.current
    }

    /// The index of the slot opened immediately before `index`.
    /// 紧接在 `index` 之前开启的槽位的下标。
    pub(crate) fn prev_index(&self, index: usize) -> usize {
        if index == 0 {
            self.slots.len() - 1
        } else {
            index - 1
        }
    }

    pub(crate) fn get(&self, index: usize) -> &MonitorInterval {
        &self.slots[index]
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> &mut MonitorInterval {
        &mut self.slots[index]
    }

    pub(crate) fn current(&self) -> &MonitorInterval {
        &self.slots[self.current]
    }

    pub(crate) fn current_mut(&mut self) -> &mut MonitorInterval {
        &mut self.slots[self.current]
    }

    /// Advances the current index, applying the eviction contract when the
    /// next slot is still occupied. Returns `true` when a measurement was
    /// sacrificed.
    ///
    /// 前进当前下标；当下一个槽位仍被占用时执行驱逐契约。
    /// 当一次测量被牺牲时返回 `true`。
    pub(crate) fn advance(&mut self) -> bool {
        self.current = (self.current + 1) % self.slots.len();
        let slot = &mut self.slots[self.current];
        if slot.valid {
            warn!(
                index = self.current,
                start_seq = slot.start_seq,
                "interval ring wrapped onto a live slot; discarding the stale measurement"
            );
            slot.valid = false;
            true
        } else {
            false
        }
    }
}
