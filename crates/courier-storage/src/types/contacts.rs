//! Contact records and the partial-update write model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ContactListMembership, Field, ListId};

/// Stored contact record, keyed by `email` within a workspace.
///
/// `email` is immutable once created. `created_at` is set once; `updated_at`
/// advances on every successful write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,

    pub external_id: Option<String>,
    pub timezone: Option<String>,
    pub language: Option<String>,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,

    pub lifetime_value: Option<f64>,
    pub orders_count: Option<i64>,
    pub last_order_at: Option<DateTime<Utc>>,

    pub custom_string_1: Option<String>,
    pub custom_string_2: Option<String>,
    pub custom_string_3: Option<String>,
    pub custom_string_4: Option<String>,
    pub custom_string_5: Option<String>,

    pub custom_number_1: Option<f64>,
    pub custom_number_2: Option<f64>,
    pub custom_number_3: Option<f64>,
    pub custom_number_4: Option<f64>,
    pub custom_number_5: Option<f64>,

    pub custom_datetime_1: Option<DateTime<Utc>>,
    pub custom_datetime_2: Option<DateTime<Utc>>,
    pub custom_datetime_3: Option<DateTime<Utc>>,
    pub custom_datetime_4: Option<DateTime<Utc>>,
    pub custom_datetime_5: Option<DateTime<Utc>>,

    pub custom_json_1: Option<Value>,
    pub custom_json_2: Option<Value>,
    pub custom_json_3: Option<Value>,
    pub custom_json_4: Option<Value>,
    pub custom_json_5: Option<Value>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial contact record for [`crate::ContactStore::upsert_contact`].
///
/// Every optional attribute is a tri-state [`Field`]: omitted fields leave the
/// stored column untouched on the update path and default to NULL on the
/// insert path. `created_at`/`updated_at` may be supplied by importers; they
/// are only honored on the insert path, the update path always restamps
/// `updated_at`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UpsertContactParams {
    pub email: String,

    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub external_id: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub timezone: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub language: Field<String>,

    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub first_name: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub last_name: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub company: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub job_title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub address_line_1: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub address_line_2: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub city: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub state: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub postal_code: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub country: Field<String>,

    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub lifetime_value: Field<f64>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub orders_count: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub last_order_at: Field<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_string_1: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_string_2: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_string_3: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_string_4: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_string_5: Field<String>,

    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_number_1: Field<f64>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_number_2: Field<f64>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_number_3: Field<f64>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_number_4: Field<f64>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_number_5: Field<f64>,

    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_datetime_1: Field<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_datetime_2: Field<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_datetime_3: Field<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_datetime_4: Field<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_datetime_5: Field<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_json_1: Field<Value>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_json_2: Field<Value>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_json_3: Field<Value>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_json_4: Field<Value>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub custom_json_5: Field<Value>,

    /// Insert-path override for importers carrying original timestamps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UpsertContactParams {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    /// Insert path: resolve every tri-state field to a column value (`Missing`
    /// and `Null` both become NULL) and stamp timestamps unless the caller
    /// already set them.
    pub fn into_new_contact(self, now: DateTime<Utc>) -> Contact {
        Contact {
            email: self.email,
            external_id: self.external_id.into_option(),
            timezone: self.timezone.into_option(),
            language: self.language.into_option(),
            first_name: self.first_name.into_option(),
            last_name: self.last_name.into_option(),
            company: self.company.into_option(),
            job_title: self.job_title.into_option(),
            address_line_1: self.address_line_1.into_option(),
            address_line_2: self.address_line_2.into_option(),
            city: self.city.into_option(),
            state: self.state.into_option(),
            postal_code: self.postal_code.into_option(),
            country: self.country.into_option(),
            lifetime_value: self.lifetime_value.into_option(),
            orders_count: self.orders_count.into_option(),
            last_order_at: self.last_order_at.into_option(),
            custom_string_1: self.custom_string_1.into_option(),
            custom_string_2: self.custom_string_2.into_option(),
            custom_string_3: self.custom_string_3.into_option(),
            custom_string_4: self.custom_string_4.into_option(),
            custom_string_5: self.custom_string_5.into_option(),
            custom_number_1: self.custom_number_1.into_option(),
            custom_number_2: self.custom_number_2.into_option(),
            custom_number_3: self.custom_number_3.into_option(),
            custom_number_4: self.custom_number_4.into_option(),
            custom_number_5: self.custom_number_5.into_option(),
            custom_datetime_1: self.custom_datetime_1.into_option(),
            custom_datetime_2: self.custom_datetime_2.into_option(),
            custom_datetime_3: self.custom_datetime_3.into_option(),
            custom_datetime_4: self.custom_datetime_4.into_option(),
            custom_datetime_5: self.custom_datetime_5.into_option(),
            custom_json_1: self.custom_json_1.into_option(),
            custom_json_2: self.custom_json_2.into_option(),
            custom_json_3: self.custom_json_3.into_option(),
            custom_json_4: self.custom_json_4.into_option(),
            custom_json_5: self.custom_json_5.into_option(),
            created_at: self.created_at.unwrap_or(now),
            updated_at: self.updated_at.unwrap_or(now),
        }
    }

    /// Update path: apply the incoming partial record over the existing row,
    /// field by field, before any SQL is built. `Missing` preserves, `Null`
    /// clears, `Value` replaces. `email` and `created_at` are immutable;
    /// `updated_at` is restamped.
    pub fn merge_into(self, existing: Contact, now: DateTime<Utc>) -> Contact {
        Contact {
            email: existing.email,
            external_id: self.external_id.resolve(existing.external_id),
            timezone: self.timezone.resolve(existing.timezone),
            language: self.language.resolve(existing.language),
            first_name: self.first_name.resolve(existing.first_name),
            last_name: self.last_name.resolve(existing.last_name),
            company: self.company.resolve(existing.company),
            job_title: self.job_title.resolve(existing.job_title),
            address_line_1: self.address_line_1.resolve(existing.address_line_1),
            address_line_2: self.address_line_2.resolve(existing.address_line_2),
            city: self.city.resolve(existing.city),
            state: self.state.resolve(existing.state),
            postal_code: self.postal_code.resolve(existing.postal_code),
            country: self.country.resolve(existing.country),
            lifetime_value: self.lifetime_value.resolve(existing.lifetime_value),
            orders_count: self.orders_count.resolve(existing.orders_count),
            last_order_at: self.last_order_at.resolve(existing.last_order_at),
            custom_string_1: self.custom_string_1.resolve(existing.custom_string_1),
            custom_string_2: self.custom_string_2.resolve(existing.custom_string_2),
            custom_string_3: self.custom_string_3.resolve(existing.custom_string_3),
            custom_string_4: self.custom_string_4.resolve(existing.custom_string_4),
            custom_string_5: self.custom_string_5.resolve(existing.custom_string_5),
            custom_number_1: self.custom_number_1.resolve(existing.custom_number_1),
            custom_number_2: self.custom_number_2.resolve(existing.custom_number_2),
            custom_number_3: self.custom_number_3.resolve(existing.custom_number_3),
            custom_number_4: self.custom_number_4.resolve(existing.custom_number_4),
            custom_number_5: self.custom_number_5.resolve(existing.custom_number_5),
            custom_datetime_1: self.custom_datetime_1.resolve(existing.custom_datetime_1),
            custom_datetime_2: self.custom_datetime_2.resolve(existing.custom_datetime_2),
            custom_datetime_3: self.custom_datetime_3.resolve(existing.custom_datetime_3),
            custom_datetime_4: self.custom_datetime_4.resolve(existing.custom_datetime_4),
            custom_datetime_5: self.custom_datetime_5.resolve(existing.custom_datetime_5),
            custom_json_1: self.custom_json_1.resolve(existing.custom_json_1),
            custom_json_2: self.custom_json_2.resolve(existing.custom_json_2),
            custom_json_3: self.custom_json_3.resolve(existing.custom_json_3),
            custom_json_4: self.custom_json_4.resolve(existing.custom_json_4),
            custom_json_5: self.custom_json_5.resolve(existing.custom_json_5),
            created_at: existing.created_at,
            updated_at: now,
        }
    }
}

/// Filter set for [`crate::ContactStore::list_contacts`].
#[derive(Clone, Debug, Default)]
pub struct ContactFilters {
    /// Substring pattern match on email.
    pub email: Option<String>,
    /// Exact match.
    pub external_id: Option<String>,
    /// Only contacts holding a live membership in this list.
    pub list_id: Option<ListId>,
    /// Eager-load list memberships for the returned page.
    pub with_memberships: bool,
}

/// One page element: the contact plus its memberships when eager loading was
/// requested (empty otherwise).
#[derive(Clone, Debug)]
pub struct ContactWithLists {
    pub contact: Contact,
    pub lists: Vec<ContactListMembership>,
}

/// One page of contacts. `next_cursor` is `None` at the end of the result set.
#[derive(Clone, Debug)]
pub struct ContactPage {
    pub contacts: Vec<ContactWithLists>,
    pub next_cursor: Option<String>,
}
