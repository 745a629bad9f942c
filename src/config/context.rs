// src/config/context.rs
//! Calendar/location contexts.
//!
//! A context decides three things: which URLs are fetched, which cookie set
//! the server sees, and which output subtree the artifacts land in. Two
//! contexts never share a subtree, so they never share resume state.

use std::fmt;

use super::consts::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Location {
    Delhi,
    Nyc,
}

impl Location {
    pub fn geoname_id(self) -> &'static str {
        match self {
            Location::Delhi => GEONAME_DELHI,
            Location::Nyc => GEONAME_NYC,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SolarCalendar {
    Tamil,
    Bengali,
    Odia,
    Malayalam,
}

impl SolarCalendar {
    pub const ALL: [SolarCalendar; 4] = [
        SolarCalendar::Tamil,
        SolarCalendar::Bengali,
        SolarCalendar::Odia,
        SolarCalendar::Malayalam,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SolarCalendar::Tamil => "tamil",
            SolarCalendar::Bengali => "bengali",
            SolarCalendar::Odia => "odia",
            SolarCalendar::Malayalam => "malayalam",
        }
    }

    fn month_path(self) -> &'static str {
        match self {
            SolarCalendar::Tamil => "/tamil/tamil-month-panchangam.html",
            SolarCalendar::Bengali => "/bengali/bengali-month-panjika.html",
            SolarCalendar::Odia => "/oriya/oriya-panji.html",
            SolarCalendar::Malayalam => "/malayalam/malayalam-month-calendar.html",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CalendarContext {
    Lunisolar { location: Location },
    Solar(SolarCalendar),
}

impl CalendarContext {
    /// Directory name under the output root.
    pub fn slug(&self) -> &'static str {
        match self {
            CalendarContext::Lunisolar { location: Location::Delhi } => "lunisolar",
            CalendarContext::Lunisolar { location: Location::Nyc } => "lunisolar_nyc",
            CalendarContext::Solar(cal) => cal.name(),
        }
    }

    pub fn location(&self) -> Location {
        match self {
            CalendarContext::Lunisolar { location } => *location,
            // Solar pages are always requested with the Delhi cookie set
            CalendarContext::Solar(_) => Location::Delhi,
        }
    }

    pub fn month_url(&self) -> String {
        match self {
            CalendarContext::Lunisolar { .. } => format!("{SITE}{LUNISOLAR_MONTH_PATH}"),
            CalendarContext::Solar(cal) => format!("{SITE}{}", cal.month_path()),
        }
    }

    /// Only the lunisolar panchang publishes per-day pages.
    pub fn day_url(&self) -> Option<String> {
        match self {
            CalendarContext::Lunisolar { .. } => Some(format!("{SITE}{LUNISOLAR_DAY_PATH}")),
            CalendarContext::Solar(_) => None,
        }
    }

    pub fn headers(&self) -> Vec<(&'static str, &'static str)> {
        vec![("user-agent", USER_AGENT)]
    }

    pub fn cookies(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            ("drik-school-name", "amanta"),
            ("drik-geoname-id", self.location().geoname_id()),
            ("drik-language", "en"),
            ("drik-time-format", "12hour"),
            ("drik-ayanamsha-type", "chitra-paksha"),
        ]
    }
}

impl fmt::Display for CalendarContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn all_contexts() -> Vec<CalendarContext> {
        let mut v = vec![
            CalendarContext::Lunisolar { location: Location::Delhi },
            CalendarContext::Lunisolar { location: Location::Nyc },
        ];
        v.extend(SolarCalendar::ALL.iter().copied().map(CalendarContext::Solar));
        v
    }

    #[test]
    fn slugs_are_distinct() {
        let slugs: HashSet<_> = all_contexts().iter().map(|c| c.slug()).collect();
        assert_eq!(slugs.len(), all_contexts().len());
    }

    #[test]
    fn location_changes_geoname_cookie_only() {
        let delhi = CalendarContext::Lunisolar { location: Location::Delhi }.cookies();
        let nyc = CalendarContext::Lunisolar { location: Location::Nyc }.cookies();
        let diff: Vec<_> = delhi.iter().zip(&nyc).filter(|(a, b)| a != b).collect();
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].0.0, "drik-geoname-id");
    }

    #[test]
    fn solar_has_no_day_pages() {
        assert!(CalendarContext::Solar(SolarCalendar::Odia).day_url().is_none());
        assert!(CalendarContext::Lunisolar { location: Location::Nyc }.day_url().is_some());
    }
}
