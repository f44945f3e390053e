//! High-water-mark cursor and new-event selection
//!
//! A cursor remembers the timestamp of the newest event already delivered for
//! one subscription. Each tick scans a freshly fetched page (newest-first)
//! against the cursor and yields the unseen events in delivery order.

use chrono::{DateTime, Utc};

use crate::{domain::ActivityDto, timestamp::parse_created_at};

/// Upper bound on events examined per tick. Caps the delivery storm after a
/// first run or a long gap between polls.
pub const SCAN_LIMIT: usize = 100;

/// Timestamp high-water mark for one subscription.
///
/// Only the owning worker's tick handler ever advances it, and advancing is
/// monotonic: the position never regresses, whatever the page contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollCursor {
    high_water: DateTime<Utc>,
}

/// Result of scanning one page against a cursor.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Unseen events in delivery order, oldest first
    pub fresh: Vec<ActivityDto>,
    /// Timestamp of the newest parseable event in the page, if any
    pub newest: Option<DateTime<Utc>>,
    /// Events skipped because their timestamp would not parse
    pub malformed: usize,
}

impl PollCursor {
    /// Seed the cursor. `None` means "now": only events strictly after
    /// creation count as new.
    pub fn new(seed: Option<DateTime<Utc>>) -> Self {
        Self {
            high_water: seed.unwrap_or_else(Utc::now),
        }
    }

    pub fn position(&self) -> DateTime<Utc> {
        self.high_water
    }

    /// Scan a newest-first page for events strictly newer than the cursor.
    ///
    /// Walks from the front and stops at the first event not newer than the
    /// high-water mark, or after [`SCAN_LIMIT`] events. The page is trusted
    /// to be sorted newest-first; if the ordering is violated the scan still
    /// stops at the first non-newer element it meets and never re-sorts.
    /// Events with unparseable timestamps are skipped without ending the
    /// scan. The selected events come back reversed into oldest-first
    /// delivery order.
    pub fn scan(&self, page: &[ActivityDto]) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        for event in page.iter().take(SCAN_LIMIT) {
            let Some(created_at) = parse_created_at(&event.created_at) else {
                outcome.malformed += 1;
                continue;
            };

            if outcome.newest.is_none() {
                outcome.newest = Some(created_at);
            }

            if created_at > self.high_water {
                outcome.fresh.push(event.clone());
            } else {
                break;
            }
        }

        outcome.fresh.reverse();
        outcome
    }

    /// Advance to a newer high-water mark. A no-op when `to` is not strictly
    /// newer, which keeps the cursor monotonic across out-of-order pages.
    pub fn advance(&mut self, to: DateTime<Utc>) -> bool {
        if to > self.high_water {
            self.high_water = to;
            true
        } else {
            false
        }
    }
}
