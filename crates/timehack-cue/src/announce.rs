//! Announcement line text

use std::fmt;

use timehack_core::{MinuteMark, UtcInstant};
use timehack_time::{CalendarProjector, Zone};

/// Announcement owned by a countdown stage
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Announcement {
    /// Seconds 50-54
    Standby,
    /// Seconds 55-59, carrying `60 - second`
    Countdown(u8),
    /// Second 0, carrying the display-zone time
    Hack(MinuteMark),
}

impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Announcement::Standby => f.write_str("TEN SECONDS, STANDBY"),
            Announcement::Countdown(digit) => write!(f, "{}", digit),
            Announcement::Hack(mark) => write!(f, "HACK, THE TIME IS NOW {}", mark),
        }
    }
}

/// Text shown while no countdown stage owns the line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefaultAnnouncement {
    /// More than 30 s remain to the next minute
    InOneMinute { next: MinuteMark, zone_label: String },
    /// 30 s or less remain
    InThirtySeconds { next: MinuteMark, zone_label: String },
}

impl DefaultAnnouncement {
    /// Compute the default line for `now` in the display zone
    pub fn at(now: UtcInstant, zone: Zone) -> Self {
        let local = CalendarProjector::to_zone_components(now, zone);
        let next = CalendarProjector::next_minute_boundary(now, zone);
        let zone_label = zone.abbreviation_at(now.add_millis(60_000));

        if local.seconds_to_next_minute() > 30 {
            DefaultAnnouncement::InOneMinute { next, zone_label }
        } else {
            DefaultAnnouncement::InThirtySeconds { next, zone_label }
        }
    }

    pub fn next(&self) -> MinuteMark {
        match self {
            DefaultAnnouncement::InOneMinute { next, .. }
            | DefaultAnnouncement::InThirtySeconds { next, .. } => *next,
        }
    }
}

impl fmt::Display for DefaultAnnouncement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultAnnouncement::InOneMinute { next, zone_label } => {
                write!(f, "IN ONE MINUTE, THE TIME WILL BE {} {}", next, zone_label)
            }
            DefaultAnnouncement::InThirtySeconds { next, zone_label } => {
                write!(f, "IN 30 SECONDS, THE TIME WILL BE {} {}", next, zone_label)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-03-10T14:05:00Z
    const MINUTE: i64 = 1_710_079_500_000;

    #[test]
    fn test_announcement_text() {
        assert_eq!(Announcement::Standby.to_string(), "TEN SECONDS, STANDBY");
        assert_eq!(Announcement::Countdown(3).to_string(), "3");
        assert_eq!(
            Announcement::Hack(MinuteMark::new(9, 7)).to_string(),
            "HACK, THE TIME IS NOW 09:07"
        );
    }

    #[test]
    fn test_default_switches_at_thirty_seconds() {
        let at = |secs: i64| DefaultAnnouncement::at(UtcInstant::from_millis(MINUTE + secs * 1000), Zone::UTC);

        assert_eq!(at(0).to_string(), "IN ONE MINUTE, THE TIME WILL BE 14:06 UTC");
        assert_eq!(at(29).to_string(), "IN ONE MINUTE, THE TIME WILL BE 14:06 UTC");
        assert_eq!(at(30).to_string(), "IN 30 SECONDS, THE TIME WILL BE 14:06 UTC");
        assert_eq!(at(59).to_string(), "IN 30 SECONDS, THE TIME WILL BE 14:06 UTC");
    }

    #[test]
    fn test_default_uses_display_zone() {
        let tokyo = Zone::parse("Asia/Tokyo").unwrap();
        let line = DefaultAnnouncement::at(UtcInstant::from_millis(MINUTE + 10_000), tokyo);

        assert_eq!(line.next(), MinuteMark::new(23, 6));
        assert_eq!(line.to_string(), "IN ONE MINUTE, THE TIME WILL BE 23:06 JST");
    }
}
