use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::display::IconCategory;

/// A single notification as returned by the notification service.
///
/// Everything except `read` is immutable once received; `read` only ever
/// moves from `false` to `true` on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub r#type: String, // 'type' is a reserved keyword
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_job: Option<JobRef>,
    /// Explicit category tag, when the service supplies one.
    #[serde(
        default,
        deserialize_with = "lenient_category",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<IconCategory>,
}

impl Notification {
    /// Whether a "view details" link should be offered.
    pub fn has_details(&self) -> bool {
        self.related_job.is_some()
    }
}

/// Weak reference to a job. The service sends either the bare id or a
/// populated object, depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobRef {
    Id(String),
    Populated {
        #[serde(alias = "_id")]
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
}

impl JobRef {
    pub fn id(&self) -> &str {
        match self {
            JobRef::Id(id) => id,
            JobRef::Populated { id, .. } => id,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            JobRef::Id(_) => None,
            JobRef::Populated { title, .. } => title.as_deref(),
        }
    }
}

/// Body of `GET /notifications`. Older deployments return a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NotificationList {
    Envelope { notifications: Vec<Notification> },
    Bare(Vec<Notification>),
}

impl NotificationList {
    pub fn into_vec(self) -> Vec<Notification> {
        match self {
            NotificationList::Envelope { notifications } => notifications,
            NotificationList::Bare(v) => v,
        }
    }
}

// Unknown category tags fall back to heuristic classification instead of
// failing the whole list.
fn lenient_category<'de, D>(deserializer: D) -> Result<Option<IconCategory>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| serde_json::from_value(v).ok()))
}
