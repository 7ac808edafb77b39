//! Per-frame projection for the renderer

use std::sync::Arc;

use timehack_core::{UtcInstant, ZoneComponents};
use timehack_cue::{CueConfig, CueInput, CueScheduler, DefaultAnnouncement, FlashPulse, FlashSequencer, Stage};
use timehack_time::{CalendarProjector, ClockSync, SyncStatus, Zone};

/// Read-only view of one frame
#[derive(Clone, Debug, PartialEq)]
pub struct FrameProjection {
    /// Synchronised instant this frame was derived from
    pub instant: UtcInstant,
    /// "HH:MM:SS" in the display zone
    pub clock_text: String,
    /// Announcement line (stage-owned or default)
    pub announcement_text: String,
    /// Flash triggered this frame
    pub flash_pulse: Option<FlashPulse>,
    /// Digit while counting down
    pub countdown_digit: Option<u8>,
    /// Whether the flash is lit at this frame
    pub flash_lit: bool,
    pub stage: Stage,
    pub stage_changed: bool,
    pub sync: SyncStatus,
}

/// Key of the cached default line: display minute and which half of it
type DefaultKey = (u8, u8, bool);

/// Frame driver combining clock, calendar and cues
pub struct HackDisplay {
    clock: Arc<ClockSync>,
    zone: Zone,
    scheduler: CueScheduler,
    flash: FlashSequencer,
    default_key: Option<DefaultKey>,
    default_line: String,
}

impl HackDisplay {
    pub fn new(clock: Arc<ClockSync>, zone: Zone, cues: CueConfig) -> Self {
        HackDisplay {
            clock,
            zone,
            scheduler: CueScheduler::new(cues),
            flash: FlashSequencer::new(),
            default_key: None,
            default_line: String::new(),
        }
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Change the display zone; cue timing stays on UTC
    pub fn set_zone(&mut self, zone: Zone) {
        self.zone = zone;
        self.default_key = None;
    }

    pub fn clock(&self) -> &Arc<ClockSync> {
        &self.clock
    }

    pub fn scheduler(&self) -> &CueScheduler {
        &self.scheduler
    }

    /// Evaluate one frame. Never blocks.
    pub fn frame(&mut self) -> FrameProjection {
        let instant = self.clock.now();
        let monotonic = self.clock.monotonic();
        let local = CalendarProjector::to_zone_components(instant, self.zone);

        let cue = self.scheduler.evaluate(CueInput {
            utc_second: CalendarProjector::utc_second(instant),
            display_time: local.minute_mark(),
            monotonic,
        });

        if let Some(pulse) = cue.flash {
            self.flash.trigger(pulse, monotonic);
        }

        let announcement_text = match self.scheduler.current_announcement() {
            Some(announcement) => announcement.to_string(),
            None => self.default_text(instant, local, cue.recompute_default),
        };

        FrameProjection {
            instant,
            clock_text: local.to_string(),
            announcement_text,
            flash_pulse: cue.flash,
            countdown_digit: cue.countdown_digit,
            flash_lit: self.flash.is_lit(monotonic),
            stage: cue.stage,
            stage_changed: cue.stage_changed,
            sync: self.clock.status(),
        }
    }

    fn default_text(&mut self, instant: UtcInstant, local: ZoneComponents, force: bool) -> String {
        let key = (local.hour, local.minute, local.second < 30);
        if force || self.default_key != Some(key) {
            self.default_line = DefaultAnnouncement::at(instant, self.zone).to_string();
            self.default_key = Some(key);
        }
        self.default_line.clone()
    }
}
