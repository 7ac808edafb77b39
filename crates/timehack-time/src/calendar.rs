//! Calendar projection of UTC instants into display zones
//!
//! Every conversion re-derives from the absolute instant, so zones with
//! non-hour offsets and DST transitions need no special casing.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

use timehack_core::{HackError, HackResult, MinuteMark, UtcInstant, ZoneComponents};

/// An IANA time zone
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Zone(Tz);

impl Zone {
    pub const UTC: Zone = Zone(Tz::UTC);

    /// Look up an IANA zone name (e.g. "America/Chicago")
    pub fn parse(name: &str) -> HackResult<Self> {
        name.trim()
            .parse::<Tz>()
            .map(Zone)
            .map_err(|_| HackError::UnknownZone(name.to_string()))
    }

    /// The host's configured zone, or UTC when it cannot be determined
    pub fn host() -> Self {
        match iana_time_zone::get_timezone() {
            Ok(name) => Self::parse(&name).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "host zone not in tz database, using UTC");
                Self::UTC
            }),
            Err(e) => {
                tracing::warn!(error = %e, "host zone undetectable, using UTC");
                Self::UTC
            }
        }
    }

    /// Resolve an optional configured name, defaulting to the host zone
    pub fn resolve(name: Option<&str>) -> HackResult<Self> {
        match name {
            Some(name) => Self::parse(name),
            None => Ok(Self::host()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Short label in effect at `instant` (e.g. "CST", "CDT", "UTC")
    pub fn abbreviation_at(&self, instant: UtcInstant) -> String {
        to_datetime(instant).with_timezone(&self.0).format("%Z").to_string()
    }
}

impl FromStr for Zone {
    type Err = HackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Zone::parse(s)
    }
}

impl Default for Zone {
    fn default() -> Self {
        Zone::UTC
    }
}

impl fmt::Debug for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Zone({})", self.name())
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn to_datetime(instant: UtcInstant) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(instant.as_millis()).unwrap_or_default()
}

/// Stateless instant-to-wall-clock projector
#[derive(Clone, Copy, Debug, Default)]
pub struct CalendarProjector;

impl CalendarProjector {
    /// Wall-clock hour/minute/second of `instant` in `zone`
    pub fn to_zone_components(instant: UtcInstant, zone: Zone) -> ZoneComponents {
        let local = to_datetime(instant).with_timezone(&zone.0);
        ZoneComponents::new(local.hour() as u8, local.minute() as u8, local.second() as u8)
    }

    /// Wall-clock minute one absolute minute after `instant`
    pub fn next_minute_boundary(instant: UtcInstant, zone: Zone) -> MinuteMark {
        Self::to_zone_components(instant.add_millis(60_000), zone).minute_mark()
    }

    /// UTC second-of-minute, the anchor for cue timing
    pub fn utc_second(instant: UtcInstant) -> u8 {
        instant.as_secs().rem_euclid(60) as u8
    }

    /// "HH:MM:SS" in `zone`
    pub fn clock_text(instant: UtcInstant, zone: Zone) -> String {
        Self::to_zone_components(instant, zone).to_string()
    }
}
