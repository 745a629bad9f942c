// src/identity.rs
//! Client identities.
//!
//! An [`Identity`] is the persona one run of requests presents to the server:
//! a fixed header set and cookie set, plus a count of requests made under it.
//! Rotation never edits an identity; it drops it and builds a new one with a
//! fresh serial, and the HTTP layer keys its client (connection pool and
//! cookie jar) on that serial.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::CalendarContext;

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
pub struct Identity {
    serial: u64,
    headers: Vec<(&'static str, &'static str)>,
    cookies: Vec<(&'static str, &'static str)>,
    uses: u32,
}

impl Identity {
    pub fn new(context: &CalendarContext) -> Self {
        Self {
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
            headers: context.headers(),
            cookies: context.cookies(),
            uses: 0,
        }
    }

    /// Process-unique; two identities are equal only if they are the same one.
    pub fn serial(&self) -> u64 { self.serial }

    pub fn headers(&self) -> &[(&'static str, &'static str)] { &self.headers }

    pub fn cookies(&self) -> &[(&'static str, &'static str)] { &self.cookies }

    /// Requests made under this identity.
    pub fn uses(&self) -> u32 { self.uses }

    pub fn record_use(&mut self) {
        self.uses += 1;
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.serial == other.serial
    }
}

impl Eq for Identity {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolarCalendar;

    #[test]
    fn fresh_identities_are_distinct_with_same_declarations() {
        let ctx = CalendarContext::Solar(SolarCalendar::Malayalam);
        let mut a = Identity::new(&ctx);
        let b = Identity::new(&ctx);
        assert_ne!(a, b);
        assert_eq!(a.cookies(), b.cookies());
        assert_eq!(a.headers(), b.headers());

        a.record_use();
        a.record_use();
        assert_eq!(a.uses(), 2);
        assert_eq!(b.uses(), 0);
    }
}
