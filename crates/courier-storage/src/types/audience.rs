//! Broadcast audience targeting types.

use serde::{Deserialize, Serialize};

use super::{Contact, ListId, SegmentId};

/// Campaign targeting rules. Immutable input to the audience resolver, not a
/// stored entity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AudienceSettings {
    /// Target these lists. Empty means every contact in the workspace.
    #[serde(default)]
    pub list_ids: Vec<ListId>,
    /// Reserved. Resolving an audience with segments fails fast.
    #[serde(default)]
    pub segment_ids: Vec<SegmentId>,
    /// Drop memberships whose status is unsubscribed, bounced, or complained.
    #[serde(default)]
    pub exclude_unsubscribed: bool,
    /// Keep one row per email (first by the active sort order).
    #[serde(default)]
    pub skip_duplicate_emails: bool,
}

/// One resolved audience row. `matched_list_id` is `None` when the audience
/// targets the whole workspace rather than specific lists.
#[derive(Clone, Debug)]
pub struct AudienceMember {
    pub contact: Contact,
    pub matched_list_id: Option<ListId>,
}
