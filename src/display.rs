//! Presentation helpers: icon classification and relative timestamps.
//!
//! Both are pure functions of their inputs so every consumer (dropdown,
//! full page, CLI) renders the same thing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::notification::Notification;

/// Icon bucket a notification is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconCategory {
    Rejected,
    Accepted,
    Pending,
    ApplicationUpdate,
    JobAlert,
    NewApplication,
    General,
}

impl IconCategory {
    pub fn icon(&self) -> &'static str {
        match self {
            IconCategory::Rejected => "✗",
            IconCategory::Accepted => "✓",
            IconCategory::Pending => "…",
            IconCategory::ApplicationUpdate => "↻",
            IconCategory::JobAlert => "★",
            IconCategory::NewApplication => "✉",
            IconCategory::General => "•",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IconCategory::Rejected => "rejected",
            IconCategory::Accepted => "accepted",
            IconCategory::Pending => "pending",
            IconCategory::ApplicationUpdate => "application update",
            IconCategory::JobAlert => "job alert",
            IconCategory::NewApplication => "new application",
            IconCategory::General => "general",
        }
    }
}

// Checked in order; first match wins.
const TITLE_RULES: &[(&str, IconCategory)] = &[
    ("rejected", IconCategory::Rejected),
    ("accepted", IconCategory::Accepted),
    ("pending", IconCategory::Pending),
];

/// Pick the icon category for a notification.
///
/// An explicit `category` from the service always wins. Otherwise the title
/// is sniffed (case-insensitive) for outcome words, and only then is the
/// `type` field consulted. Unknown types map to [`IconCategory::General`].
pub fn classify(notification: &Notification) -> IconCategory {
    if let Some(category) = notification.category {
        return category;
    }

    let title = notification.title.to_lowercase();
    for (needle, category) in TITLE_RULES {
        if title.contains(needle) {
            return *category;
        }
    }

    match notification.r#type.as_str() {
        "application_status" | "application_status_change" | "status_change" => {
            IconCategory::ApplicationUpdate
        }
        "job_alert" => IconCategory::JobAlert,
        "new_application" | "application_received" => IconCategory::NewApplication,
        _ => IconCategory::General,
    }
}

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;

/// Render `timestamp` relative to `now`.
///
/// Anything under a minute (including timestamps slightly in the future
/// from clock skew) is "just now". From seven days on, the absolute date is
/// shown instead.
pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - timestamp).num_seconds().max(0);

    if elapsed < MINUTE {
        "just now".to_string()
    } else if elapsed < HOUR {
        ago(elapsed / MINUTE, "minute")
    } else if elapsed < DAY {
        ago(elapsed / HOUR, "hour")
    } else if elapsed < WEEK {
        ago(elapsed / DAY, "day")
    } else {
        format_absolute_date(timestamp)
    }
}

/// Absolute date used for old notifications, e.g. `Oct 8, 2026`.
pub fn format_absolute_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%b %-d, %Y").to_string()
}

fn ago(count: i64, unit: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{} {}{} ago", count, unit, suffix)
}
