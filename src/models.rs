use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::utils::format_time_label;

static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

/// Identifies one dispatched request so that a response arriving after the
/// user moved on can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn next() -> Self {
        Ticket(NEXT_TICKET.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// Body of `POST /caffeine/add`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCaffeinePayload {
    pub date_time: String,
    pub store_name: String,
    pub size: String,
    pub menu_name: String,
}

/// A logged drink as shown in the session list. Created only after the
/// backend accepted the matching [`AddCaffeinePayload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaffeineEntry {
    pub id: Uuid,
    pub beverage: String,
    pub category: String,
    pub time: DateTime<Local>,
    pub mg: Option<u32>,
    pub store_name: String,
    pub size: String,
}

impl CaffeineEntry {
    pub fn time_label(&self) -> String {
        format_time_label(self.time.time())
    }
}

/// Self-reported condition after waking up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Bad,
    Normal,
    Great,
}

impl Condition {
    pub const ALL: [Condition; 3] = [Condition::Great, Condition::Normal, Condition::Bad];

    /// The 1..=3 scale the daily summary endpoint expects
    pub fn freshness(self) -> u8 {
        match self {
            Condition::Bad => 1,
            Condition::Normal => 2,
            Condition::Great => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Condition::Bad => "Bad",
            Condition::Normal => "Normal",
            Condition::Great => "Great",
        }
    }
}

/// Body of `POST /api/daily-summary`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummaryRequest {
    pub user_id: String,
    pub sleep_start_at: DateTime<Utc>,
    pub sleep_end_at: DateTime<Utc>,
    pub freshness: u8,
}

/// Opaque credentials captured at login and replayed as request headers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthParams {
    pub user_id: String,
    pub token: Option<String>,
}

/// `{ "result": ... }` wrapper used by the single-value GET endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ResultEnvelope<T> {
    #[serde(default)]
    pub result: Option<T>,
}
