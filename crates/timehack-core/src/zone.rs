//! Wall-clock projections of an instant in some display zone

use std::fmt;

/// Hour/minute/second of an instant as seen in one zone
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ZoneComponents {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl ZoneComponents {
    pub fn new(hour: u8, minute: u8, second: u8) -> Self {
        debug_assert!(hour < 24 && minute < 60 && second < 60);
        ZoneComponents {
            hour,
            minute,
            second,
        }
    }

    /// Seconds left before the next top-of-minute (1..=60)
    #[inline]
    pub fn seconds_to_next_minute(&self) -> u8 {
        60 - self.second
    }

    #[inline]
    pub fn minute_mark(&self) -> MinuteMark {
        MinuteMark {
            hour: self.hour,
            minute: self.minute,
        }
    }
}

impl fmt::Debug for ZoneComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Zone({})", self)
    }
}

impl fmt::Display for ZoneComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// Hour and minute of a wall-clock minute
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct MinuteMark {
    pub hour: u8,
    pub minute: u8,
}

impl MinuteMark {
    pub fn new(hour: u8, minute: u8) -> Self {
        MinuteMark { hour, minute }
    }
}

impl fmt::Display for MinuteMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components_display_zero_padded() {
        let c = ZoneComponents::new(7, 5, 9);
        assert_eq!(c.to_string(), "07:05:09");
        assert_eq!(c.minute_mark().to_string(), "07:05");
    }

    #[test]
    fn test_seconds_to_next_minute() {
        assert_eq!(ZoneComponents::new(0, 0, 0).seconds_to_next_minute(), 60);
        assert_eq!(ZoneComponents::new(0, 0, 29).seconds_to_next_minute(), 31);
        assert_eq!(ZoneComponents::new(0, 0, 59).seconds_to_next_minute(), 1);
    }
}
