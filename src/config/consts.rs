// src/config/consts.rs

// Net config
pub const SITE: &str = "https://www.drikpanchang.com";
pub const LUNISOLAR_MONTH_PATH: &str = "/panchang/month-panchang.html";
pub const LUNISOLAR_DAY_PATH: &str = "/panchang/day-panchang.html";
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

pub const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) ",
    "AppleWebKit/537.36 (KHTML, like Gecko) ",
    "Chrome/120.0.0.0 Safari/537.36"
);

// Geoname ids understood by the site's location cookie
pub const GEONAME_DELHI: &str = "1261481";
pub const GEONAME_NYC: &str = "5128581";

// Block detection. Normal pages are 150-250 KB; challenge pages are ~2 KB.
pub const MIN_VALID_SIZE: usize = 50_000;

// Identity rotation; blocks tend to start somewhere around 200-400 requests
pub const ROTATE_EVERY: u32 = 10;

// Pacing
pub const DEFAULT_DELAY_SECS: f64 = 20.0;
pub const PACE_SLICE_MS: u64 = 100; // cancellation poll granularity while sleeping

// Range
pub const DEFAULT_START_YEAR: i32 = 1900;
pub const DEFAULT_END_YEAR: i32 = 2050;

// Output
pub const DEFAULT_OUT_DIR: &str = "data";
pub const ARTIFACT_EXT: &str = "html";
pub const PARTIAL_EXT: &str = "part";
