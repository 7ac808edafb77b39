//! Cue scheduler - per-frame countdown and flash state machine
//!
//! Stages advance NONE -> STANDBY (50-54) -> COUNTDOWN (55-59) -> HACK (0).
//! Second-driven effects fire only on the first evaluation of a given second
//! value. HACK is held by its own monotonic timer, not by the second value.

use std::time::Duration;

use timehack_core::{HackConfig, MinuteMark, MonotonicMs};

use crate::{Announcement, FlashPulse};

/// Countdown stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    None,
    Standby,
    Countdown,
    Hack,
}

impl Stage {
    /// Stages that own the announcement line
    pub fn owns_announcement(self) -> bool {
        self != Stage::None
    }
}

/// Edge-detection record
/// INVARIANT: `last_*_second` is -1 (re-armed) or a second value 0..=59
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CueState {
    pub last_flash_second: i8,
    pub last_countdown_second: i8,
    pub stage: Stage,
}

impl Default for CueState {
    fn default() -> Self {
        CueState {
            last_flash_second: -1,
            last_countdown_second: -1,
            stage: Stage::None,
        }
    }
}

/// Scheduler timing
#[derive(Clone, Debug)]
pub struct CueConfig {
    /// How long the HACK announcement is held
    pub hack_hold: Duration,
    /// Pulse emitted on each active-window second
    pub tick_pulse: FlashPulse,
    /// Pulse train emitted at :00 and :30
    pub boundary_pulse: FlashPulse,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self::from_config(&HackConfig::default())
    }
}

impl CueConfig {
    pub fn from_config(config: &HackConfig) -> Self {
        CueConfig {
            hack_hold: config.hack_hold(),
            tick_pulse: FlashPulse::single(config),
            boundary_pulse: FlashPulse::boundary(config),
        }
    }
}

/// Inputs for one evaluation
#[derive(Clone, Copy, Debug)]
pub struct CueInput {
    /// UTC second-of-minute of the synchronised clock
    pub utc_second: u8,
    /// Display-zone hour and minute at the same instant
    pub display_time: MinuteMark,
    /// Monotonic reading, drives the HACK hold timer
    pub monotonic: MonotonicMs,
}

/// Result of one evaluation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CueOutput {
    /// Flash triggered by this evaluation
    pub flash: Option<FlashPulse>,
    /// Announcement newly set by this evaluation
    pub announcement: Option<Announcement>,
    /// Digit on display while in COUNTDOWN
    pub countdown_digit: Option<u8>,
    /// Stage after this evaluation
    pub stage: Stage,
    /// Stage differs from the previous evaluation
    pub stage_changed: bool,
    /// The stage released the announcement line; recompute the default text
    pub recompute_default: bool,
}

/// Per-frame cue scheduler
pub struct CueScheduler {
    config: CueConfig,
    state: CueState,
    /// Announcement held by the current stage
    current: Option<Announcement>,
    /// Start of the HACK hold
    hack_started: Option<MonotonicMs>,
}

impl CueScheduler {
    pub fn new(config: CueConfig) -> Self {
        CueScheduler {
            config,
            state: CueState::default(),
            current: None,
            hack_started: None,
        }
    }

    pub fn state(&self) -> CueState {
        self.state
    }

    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    /// Announcement owned by the current stage, if any
    pub fn current_announcement(&self) -> Option<Announcement> {
        self.current
    }

    /// Evaluate one frame
    pub fn evaluate(&mut self, input: CueInput) -> CueOutput {
        debug_assert!(input.utc_second < 60);
        let second = input.utc_second as i8;
        let previous = self.state.stage;
        let mut flash = None;
        let mut announcement = None;
        let mut recompute_default = false;

        if self.hack_expired(input.monotonic) {
            self.set_stage(Stage::None, None);
            self.hack_started = None;
            recompute_default = true;
        }

        if second >= 50 || second == 0 {
            if second != self.state.last_countdown_second {
                self.state.last_countdown_second = second;

                let (stage, text) = match second {
                    0 => (Stage::Hack, Announcement::Hack(input.display_time)),
                    50..=54 => (Stage::Standby, Announcement::Standby),
                    _ => (Stage::Countdown, Announcement::Countdown((60 - second) as u8)),
                };

                self.hack_started = (stage == Stage::Hack).then_some(input.monotonic);
                self.set_stage(stage, Some(text));
                announcement = Some(text);
                flash = Some(self.config.tick_pulse);
            }
        } else {
            self.state.last_countdown_second = -1;
            if matches!(self.state.stage, Stage::Standby | Stage::Countdown) {
                self.set_stage(Stage::None, None);
                recompute_default = true;
            }
        }

        if second == 0 || second == 30 {
            if second != self.state.last_flash_second {
                self.state.last_flash_second = second;
                flash = Some(self.config.boundary_pulse);
            }
        } else {
            self.state.last_flash_second = -1;
        }

        let countdown_digit = match self.current {
            Some(Announcement::Countdown(digit)) => Some(digit),
            _ => None,
        };

        CueOutput {
            flash,
            announcement,
            countdown_digit,
            stage: self.state.stage,
            stage_changed: self.state.stage != previous,
            recompute_default,
        }
    }

    fn hack_expired(&self, now: MonotonicMs) -> bool {
        match (self.state.stage, self.hack_started) {
            (Stage::Hack, Some(started)) => {
                now.elapsed_since(started) >= self.config.hack_hold.as_secs_f64() * 1000.0
            }
            _ => false,
        }
    }

    fn set_stage(&mut self, stage: Stage, text: Option<Announcement>) {
        if stage != self.state.stage {
            tracing::debug!(from = ?self.state.stage, to = ?stage, "cue stage");
        }
        self.state.stage = stage;
        self.current = text;
    }
}

impl Default for CueScheduler {
    fn default() -> Self {
        Self::new(CueConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HACK_TIME: MinuteMark = MinuteMark { hour: 14, minute: 6 };

    /// Feed seconds one real second apart, with several frames per second
    fn run(scheduler: &mut CueScheduler, seconds: &[u8], start_ms: f64) -> Vec<CueOutput> {
        let mut outputs = Vec::new();
        for (i, &s) in seconds.iter().enumerate() {
            for frame in 0..4 {
                let monotonic = MonotonicMs::from_millis(start_ms + i as f64 * 1000.0 + frame as f64 * 100.0);
                outputs.push(scheduler.evaluate(CueInput {
                    utc_second: s,
                    display_time: HACK_TIME,
                    monotonic,
                }));
            }
        }
        outputs
    }

    fn input(second: u8, ms: f64) -> CueInput {
        CueInput {
            utc_second: second,
            display_time: HACK_TIME,
            monotonic: MonotonicMs::from_millis(ms),
        }
    }

    #[test]
    fn test_single_boundary_flash_at_top_of_minute() {
        let mut scheduler = CueScheduler::default();
        let outputs = run(&mut scheduler, &[58, 59, 0, 1], 0.0);

        let boundary: Vec<usize> = outputs
            .iter()
            .enumerate()
            .filter(|(_, o)| o.flash.map(|f| f.count) == Some(3))
            .map(|(i, _)| i)
            .collect();

        // index 8 = first frame of second 0
        assert_eq!(boundary, vec![8]);
        assert_eq!(outputs[0].flash.map(|f| f.count), Some(1));
        assert_eq!(outputs[4].flash.map(|f| f.count), Some(1));
        assert!(outputs[12].flash.is_none());
    }

    #[test]
    fn test_countdown_sequence() {
        let mut scheduler = CueScheduler::default();
        let seconds: Vec<u8> = (50..60).chain(std::iter::once(0)).collect();

        let texts: Vec<String> = seconds
            .iter()
            .enumerate()
            .map(|(i, &s)| {
                let out = scheduler.evaluate(input(s, i as f64 * 1000.0));
                out.announcement.expect("new second announces").to_string()
            })
            .collect();

        assert_eq!(
            texts,
            vec![
                "TEN SECONDS, STANDBY",
                "TEN SECONDS, STANDBY",
                "TEN SECONDS, STANDBY",
                "TEN SECONDS, STANDBY",
                "TEN SECONDS, STANDBY",
                "5",
                "4",
                "3",
                "2",
                "1",
                "HACK, THE TIME IS NOW 14:06",
            ]
        );
        assert_eq!(scheduler.stage(), Stage::Hack);
    }

    #[test]
    fn test_countdown_digit_and_stage_changes() {
        let mut scheduler = CueScheduler::default();

        let standby = scheduler.evaluate(input(50, 0.0));
        assert_eq!(standby.stage, Stage::Standby);
        assert!(standby.stage_changed);
        assert_eq!(standby.countdown_digit, None);

        let countdown = scheduler.evaluate(input(55, 5_000.0));
        assert!(countdown.stage_changed);
        assert_eq!(countdown.countdown_digit, Some(5));

        let repeat = scheduler.evaluate(input(55, 5_500.0));
        assert!(!repeat.stage_changed);
        assert_eq!(repeat.countdown_digit, Some(5));
    }

    #[test]
    fn test_hack_held_then_cleared_by_timer() {
        let mut scheduler = CueScheduler::default();
        scheduler.evaluate(input(59, 0.0));
        let hack = scheduler.evaluate(input(0, 1_000.0));
        assert_eq!(hack.stage, Stage::Hack);

        for (s, ms) in [(1, 2_000.0), (2, 3_000.0), (3, 4_000.0), (5, 5_999.0)] {
            let out = scheduler.evaluate(input(s, ms));
            assert_eq!(out.stage, Stage::Hack, "second {}", s);
            assert!(!out.recompute_default);
            assert_eq!(
                scheduler.current_announcement(),
                Some(Announcement::Hack(HACK_TIME))
            );
        }

        let cleared = scheduler.evaluate(input(6, 6_000.0));
        assert_eq!(cleared.stage, Stage::None);
        assert!(cleared.stage_changed);
        assert!(cleared.recompute_default);
        assert_eq!(scheduler.current_announcement(), None);
    }

    #[test]
    fn test_repeated_second_is_idempotent() {
        let mut scheduler = CueScheduler::default();

        for s in [30u8, 52, 57, 0] {
            let first = scheduler.evaluate(input(s, 0.0));
            assert!(first.flash.is_some(), "second {}", s);
            let state = scheduler.state();

            let second = scheduler.evaluate(input(s, 50.0));
            assert!(second.flash.is_none());
            assert!(second.announcement.is_none());
            assert!(!second.stage_changed);
            assert_eq!(scheduler.state(), state);
        }
    }

    #[test]
    fn test_half_minute_flash_only() {
        let mut scheduler = CueScheduler::default();
        let outputs = run(&mut scheduler, &[29, 30, 31], 0.0);

        let flashes: Vec<_> = outputs.iter().filter_map(|o| o.flash).collect();
        assert_eq!(flashes, vec![FlashPulse::new(3, 160, 150)]);
        assert!(outputs.iter().all(|o| o.stage == Stage::None && o.announcement.is_none()));
    }

    #[test]
    fn test_leaving_window_rearms_countdown() {
        let mut scheduler = CueScheduler::default();
        scheduler.evaluate(input(53, 0.0));

        // Clock stepped back out of the window
        let out = scheduler.evaluate(input(40, 100.0));
        assert_eq!(out.stage, Stage::None);
        assert!(out.recompute_default);
        assert_eq!(scheduler.state().last_countdown_second, -1);

        let again = scheduler.evaluate(input(53, 200.0));
        assert_eq!(again.announcement, Some(Announcement::Standby));
    }

    #[test]
    fn test_short_hold_does_not_refire_within_same_second() {
        let mut scheduler = CueScheduler::new(CueConfig {
            hack_hold: Duration::from_millis(200),
            ..CueConfig::default()
        });

        scheduler.evaluate(input(0, 0.0));
        let out = scheduler.evaluate(input(0, 300.0));

        assert_eq!(out.stage, Stage::None);
        assert!(out.recompute_default);
        assert!(out.announcement.is_none());
        assert!(out.flash.is_none());
    }

    #[test]
    fn test_next_cycle_after_hack() {
        let mut scheduler = CueScheduler::default();
        let seconds: Vec<u8> = (50..60).chain(0..60).chain(std::iter::once(0)).collect();
        let outputs = run(&mut scheduler, &seconds, 0.0);

        let hacks = outputs
            .iter()
            .filter(|o| matches!(o.announcement, Some(Announcement::Hack(_))))
            .count();
        let boundary = outputs
            .iter()
            .filter(|o| o.flash.map(|f| f.count) == Some(3))
            .count();

        assert_eq!(hacks, 2);
        // :00, :30, :00
        assert_eq!(boundary, 3);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn stage_matches_second_window(
                seconds in proptest::collection::vec(0u8..60, 1..200),
            ) {
                let mut scheduler = CueScheduler::default();
                for (i, s) in seconds.iter().enumerate() {
                    let out = scheduler.evaluate(input(*s, i as f64 * 250.0));
                    match *s {
                        50..=54 => prop_assert_eq!(out.stage, Stage::Standby),
                        55..=59 => prop_assert_eq!(out.stage, Stage::Countdown),
                        0 => prop_assert!(matches!(out.stage, Stage::Hack | Stage::None)),
                        _ => prop_assert!(matches!(out.stage, Stage::Hack | Stage::None)),
                    }
                    let state = scheduler.state();
                    prop_assert!((-1..60).contains(&state.last_flash_second));
                    prop_assert!((-1..60).contains(&state.last_countdown_second));
                }
            }
        }
    }
}
