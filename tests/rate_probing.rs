//! 启动加倍、丢包回退与探测裁决的端到端测试
//! End-to-end tests for startup doubling, loss fallback, and probe verdicts

pub mod common;

use std::time::Duration;

use common::harness::LinkHarness;
use petrel_pacing::config::Config;
use petrel_pacing::core::decision::Phase;

const RTT: Duration = Duration::from_millis(20);
const ACK_EVERY: Duration = Duration::from_millis(5);

fn is_probing(phase: &Phase) -> bool {
    matches!(
        phase,
        Phase::Probe1
            | Phase::Probe2
            | Phase::Probe3
            | Phase::Probe4
            | Phase::WaitForDecision
    )
}

#[test]
fn test_startup_doubles_while_utility_improves() {
    let mut link = LinkHarness::new(Config::default(), RTT);

    link.run(Duration::from_millis(120), ACK_EVERY, 0);

    // Lossless intervals keep improving on each other, so the exponential
    // ramp never breaks.
    assert_eq!(link.phase(), Phase::Start);
    assert!(
        link.rates_seen.len() >= 4,
        "expected several ramp steps, saw {:?}",
        link.rates_seen
    );
    for pair in link.rates_seen[..4].windows(2) {
        assert_eq!(pair[1], pair[0] * 2, "ramp broke: {:?}", link.rates_seen);
    }
}

#[test]
fn test_loss_collapse_falls_back_to_probing() {
    let mut link = LinkHarness::new(Config::default(), RTT);
    link.run(Duration::from_millis(120), ACK_EVERY, 0);
    let peak = link.pacing_rate();
    assert_eq!(link.phase(), Phase::Start);

    // One fifth of every delivery is now a lost hole: utilities collapse
    // past the gate and the exponential ramp is abandoned.
    link.run(Duration::from_millis(150), ACK_EVERY, 200);

    assert_ne!(link.phase(), Phase::Start);
    assert!(
        link.phases_seen.iter().any(is_probing),
        "never probed: {:?}",
        link.phases_seen
    );
    assert!(
        link.pacing_rate() < peak,
        "rate {} did not come down from peak {}",
        link.pacing_rate(),
        peak
    );
}

#[test]
fn test_clean_probe_quartet_resolves_to_upward_adjustment() {
    let mut link = LinkHarness::new(Config::default(), RTT);
    link.run(Duration::from_millis(120), ACK_EVERY, 0);
    link.run(Duration::from_millis(100), ACK_EVERY, 200);

    // Once the link is clean again, raised probes beat lowered probes in
    // both pairs and the engine commits to ramping upward.
    link.run(Duration::from_millis(500), ACK_EVERY, 0);

    assert_eq!(link.phase(), Phase::RateAdjust);
    let rates = &link.rates_seen;
    assert!(rates.len() >= 3);
    assert!(
        rates[rates.len() - 1] > rates[rates.len() - 2]
            && rates[rates.len() - 2] > rates[rates.len() - 3],
        "tail of {:?} is not climbing",
        rates
    );
}

#[test]
fn test_rate_never_falls_below_the_floor_under_heavy_loss() {
    let mut link = LinkHarness::new(Config::default(), RTT);

    // Half of everything is lost; the floor invariant is asserted by the
    // harness after every single event.
    link.run(Duration::from_millis(600), ACK_EVERY, 500);

    assert!(
        link.controller.stats().intervals_completed > 5,
        "controller stopped measuring"
    );
}
