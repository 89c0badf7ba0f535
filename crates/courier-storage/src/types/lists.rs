//! Contact list membership types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ListId;
use crate::StoreError;

/// Delivery status of a contact on a list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Active,
    Unsubscribed,
    Bounced,
    Complained,
}

impl MembershipStatus {
    /// Statuses a broadcast must not deliver to when the audience excludes
    /// unsubscribed contacts.
    pub const EXCLUDED_FROM_BROADCASTS: [MembershipStatus; 3] = [
        MembershipStatus::Unsubscribed,
        MembershipStatus::Bounced,
        MembershipStatus::Complained,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Active => "active",
            MembershipStatus::Unsubscribed => "unsubscribed",
            MembershipStatus::Bounced => "bounced",
            MembershipStatus::Complained => "complained",
        }
    }
}

impl std::str::FromStr for MembershipStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(MembershipStatus::Active),
            "unsubscribed" => Ok(MembershipStatus::Unsubscribed),
            "bounced" => Ok(MembershipStatus::Bounced),
            "complained" => Ok(MembershipStatus::Complained),
            other => Err(StoreError::Backend(format!(
                "unknown membership status {other:?}"
            ))),
        }
    }
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership row: `(contact_email, list_id)` is unique. Removal is a soft
/// delete; live rows have `deleted_at = None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContactListMembership {
    pub contact_email: String,
    pub list_id: ListId,
    pub status: MembershipStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
