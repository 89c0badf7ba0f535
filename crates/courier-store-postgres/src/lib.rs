//! Postgres backend for the courier contact data access core.
//!
//! Implements [`ContactStore`] against one database per workspace. The pool
//! for a workspace comes from a [`WorkspaceRouter`] and is borrowed per call;
//! nothing is cached across calls. The upsert path is the sole writer and the
//! only place that takes a lock: a `SELECT … FOR UPDATE` on the email row
//! serializes concurrent upserts of the same contact, while upserts of
//! different contacts and all reads run fully concurrently.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use courier_storage::{
    AudienceMember, AudienceSettings, Contact, ContactFilters, ContactListMembership, ContactPage,
    ContactStore, ContactWithLists, Cursor, ListId, MembershipStatus, StoreError,
    UpsertContactParams, WorkspaceId,
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Maps a workspace to its live database pool.
///
/// The tenancy layer owns this; the store treats it as opaque. A failure here
/// is wrapped as [`StoreError::Connection`] and surfaced, never retried.
#[async_trait::async_trait]
pub trait WorkspaceRouter: Send + Sync {
    async fn pool(&self, workspace: &WorkspaceId) -> Result<PgPool, StoreError>;
}

/// Fixed workspace → pool map for composition roots and tests.
#[derive(Default)]
pub struct StaticRouter {
    pools: HashMap<Uuid, PgPool>,
}

impl StaticRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, workspace: WorkspaceId, pool: PgPool) {
        self.pools.insert(workspace.0, pool);
    }
}

#[async_trait::async_trait]
impl WorkspaceRouter for StaticRouter {
    async fn pool(&self, workspace: &WorkspaceId) -> Result<PgPool, StoreError> {
        self.pools.get(&workspace.0).cloned().ok_or_else(|| {
            StoreError::Connection(format!("no database registered for workspace {}", workspace.0))
        })
    }
}

/// Open a workspace database and bring its schema up to date.
pub async fn open_workspace(url: &str) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

    MIGRATOR
        .run(&pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

    tracing::debug!("workspace database migrated");
    Ok(pool)
}

pub struct PostgresContactStore {
    router: Arc<dyn WorkspaceRouter>,
}

impl PostgresContactStore {
    pub fn new(router: Arc<dyn WorkspaceRouter>) -> Self {
        Self { router }
    }
}

// JSONB slots travel as text so an undecodable value fails with the slot
// named instead of deep inside the driver.
const CONTACT_COLUMNS: &str = "c.email, c.external_id, c.timezone, c.language, \
     c.first_name, c.last_name, c.company, c.job_title, \
     c.address_line_1, c.address_line_2, c.city, c.state, c.postal_code, c.country, \
     c.lifetime_value, c.orders_count, c.last_order_at, \
     c.custom_string_1, c.custom_string_2, c.custom_string_3, c.custom_string_4, c.custom_string_5, \
     c.custom_number_1, c.custom_number_2, c.custom_number_3, c.custom_number_4, c.custom_number_5, \
     c.custom_datetime_1, c.custom_datetime_2, c.custom_datetime_3, c.custom_datetime_4, c.custom_datetime_5, \
     c.custom_json_1::text AS custom_json_1, c.custom_json_2::text AS custom_json_2, \
     c.custom_json_3::text AS custom_json_3, c.custom_json_4::text AS custom_json_4, \
     c.custom_json_5::text AS custom_json_5, \
     c.created_at, c.updated_at";

const INSERT_CONTACT: &str = "INSERT INTO contacts(email, external_id, timezone, language, \
     first_name, last_name, company, job_title, \
     address_line_1, address_line_2, city, state, postal_code, country, \
     lifetime_value, orders_count, last_order_at, \
     custom_string_1, custom_string_2, custom_string_3, custom_string_4, custom_string_5, \
     custom_number_1, custom_number_2, custom_number_3, custom_number_4, custom_number_5, \
     custom_datetime_1, custom_datetime_2, custom_datetime_3, custom_datetime_4, custom_datetime_5, \
     custom_json_1, custom_json_2, custom_json_3, custom_json_4, custom_json_5, \
     created_at, updated_at) \
     VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
     $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32, \
     $33::jsonb, $34::jsonb, $35::jsonb, $36::jsonb, $37::jsonb, $38, $39)";

const UPDATE_CONTACT: &str = "UPDATE contacts SET external_id = $1, timezone = $2, language = $3, \
     first_name = $4, last_name = $5, company = $6, job_title = $7, \
     address_line_1 = $8, address_line_2 = $9, city = $10, state = $11, postal_code = $12, country = $13, \
     lifetime_value = $14, orders_count = $15, last_order_at = $16, \
     custom_string_1 = $17, custom_string_2 = $18, custom_string_3 = $19, custom_string_4 = $20, custom_string_5 = $21, \
     custom_number_1 = $22, custom_number_2 = $23, custom_number_3 = $24, custom_number_4 = $25, custom_number_5 = $26, \
     custom_datetime_1 = $27, custom_datetime_2 = $28, custom_datetime_3 = $29, custom_datetime_4 = $30, custom_datetime_5 = $31, \
     custom_json_1 = $32::jsonb, custom_json_2 = $33::jsonb, custom_json_3 = $34::jsonb, \
     custom_json_4 = $35::jsonb, custom_json_5 = $36::jsonb, \
     updated_at = $37 \
     WHERE email = $38";

#[derive(sqlx::FromRow)]
struct ContactRow {
    email: String,
    external_id: Option<String>,
    timezone: Option<String>,
    language: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    company: Option<String>,
    job_title: Option<String>,
    address_line_1: Option<String>,
    address_line_2: Option<String>,
    city: Option<String>,
    state: Option<String>,
    postal_code: Option<String>,
    country: Option<String>,
    lifetime_value: Option<f64>,
    orders_count: Option<i64>,
    last_order_at: Option<DateTime<Utc>>,
    custom_string_1: Option<String>,
    custom_string_2: Option<String>,
    custom_string_3: Option<String>,
    custom_string_4: Option<String>,
    custom_string_5: Option<String>,
    custom_number_1: Option<f64>,
    custom_number_2: Option<f64>,
    custom_number_3: Option<f64>,
    custom_number_4: Option<f64>,
    custom_number_5: Option<f64>,
    custom_datetime_1: Option<DateTime<Utc>>,
    custom_datetime_2: Option<DateTime<Utc>>,
    custom_datetime_3: Option<DateTime<Utc>>,
    custom_datetime_4: Option<DateTime<Utc>>,
    custom_datetime_5: Option<DateTime<Utc>>,
    custom_json_1: Option<String>,
    custom_json_2: Option<String>,
    custom_json_3: Option<String>,
    custom_json_4: Option<String>,
    custom_json_5: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ContactRow {
    fn into_contact(self) -> Result<Contact, StoreError> {
        Ok(Contact {
            email: self.email,
            external_id: self.external_id,
            timezone: self.timezone,
            language: self.language,
            first_name: self.first_name,
            last_name: self.last_name,
            company: self.company,
            job_title: self.job_title,
            address_line_1: self.address_line_1,
            address_line_2: self.address_line_2,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            country: self.country,
            lifetime_value: self.lifetime_value,
            orders_count: self.orders_count,
            last_order_at: self.last_order_at,
            custom_string_1: self.custom_string_1,
            custom_string_2: self.custom_string_2,
            custom_string_3: self.custom_string_3,
            custom_string_4: self.custom_string_4,
            custom_string_5: self.custom_string_5,
            custom_number_1: self.custom_number_1,
            custom_number_2: self.custom_number_2,
            custom_number_3: self.custom_number_3,
            custom_number_4: self.custom_number_4,
            custom_number_5: self.custom_number_5,
            custom_datetime_1: self.custom_datetime_1,
            custom_datetime_2: self.custom_datetime_2,
            custom_datetime_3: self.custom_datetime_3,
            custom_datetime_4: self.custom_datetime_4,
            custom_datetime_5: self.custom_datetime_5,
            custom_json_1: decode_json_slot("custom_json_1", self.custom_json_1)?,
            custom_json_2: decode_json_slot("custom_json_2", self.custom_json_2)?,
            custom_json_3: decode_json_slot("custom_json_3", self.custom_json_3)?,
            custom_json_4: decode_json_slot("custom_json_4", self.custom_json_4)?,
            custom_json_5: decode_json_slot("custom_json_5", self.custom_json_5)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AudienceRow {
    #[sqlx(flatten)]
    contact: ContactRow,
    matched_list_id: Option<Uuid>,
}

#[derive(sqlx::FromRow)]
struct MembershipRow {
    contact_email: String,
    list_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl MembershipRow {
    fn into_membership(self) -> Result<ContactListMembership, StoreError> {
        Ok(ContactListMembership {
            contact_email: self.contact_email,
            list_id: ListId(self.list_id),
            status: MembershipStatus::from_str(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

fn decode_json_slot(slot: &str, raw: Option<String>) -> Result<Option<Value>, StoreError> {
    raw.map(|s| {
        serde_json::from_str(&s).map_err(|e| StoreError::Serialization {
            slot: slot.to_string(),
            reason: e.to_string(),
        })
    })
    .transpose()
}

fn encode_json_slot(slot: &str, value: Option<&Value>) -> Result<Option<String>, StoreError> {
    value
        .map(|v| {
            serde_json::to_string(v).map_err(|e| StoreError::Serialization {
                slot: slot.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

/// Serialize the five JSON slots up front; a failure on any one aborts the
/// whole operation before a single row is touched.
fn encode_json_slots(contact: &Contact) -> Result<[Option<String>; 5], StoreError> {
    Ok([
        encode_json_slot("custom_json_1", contact.custom_json_1.as_ref())?,
        encode_json_slot("custom_json_2", contact.custom_json_2.as_ref())?,
        encode_json_slot("custom_json_3", contact.custom_json_3.as_ref())?,
        encode_json_slot("custom_json_4", contact.custom_json_4.as_ref())?,
        encode_json_slot("custom_json_5", contact.custom_json_5.as_ref())?,
    ])
}

/// Bind the 36 optional attributes in the shared column order used by both
/// [`INSERT_CONTACT`] and [`UPDATE_CONTACT`].
fn bind_contact_fields<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    contact: &'q Contact,
    json_slots: &'q [Option<String>; 5],
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    query
        .bind(contact.external_id.as_deref())
        .bind(contact.timezone.as_deref())
        .bind(contact.language.as_deref())
        .bind(contact.first_name.as_deref())
        .bind(contact.last_name.as_deref())
        .bind(contact.company.as_deref())
        .bind(contact.job_title.as_deref())
        .bind(contact.address_line_1.as_deref())
        .bind(contact.address_line_2.as_deref())
        .bind(contact.city.as_deref())
        .bind(contact.state.as_deref())
        .bind(contact.postal_code.as_deref())
        .bind(contact.country.as_deref())
        .bind(contact.lifetime_value)
        .bind(contact.orders_count)
        .bind(contact.last_order_at)
        .bind(contact.custom_string_1.as_deref())
        .bind(contact.custom_string_2.as_deref())
        .bind(contact.custom_string_3.as_deref())
        .bind(contact.custom_string_4.as_deref())
        .bind(contact.custom_string_5.as_deref())
        .bind(contact.custom_number_1)
        .bind(contact.custom_number_2)
        .bind(contact.custom_number_3)
        .bind(contact.custom_number_4)
        .bind(contact.custom_number_5)
        .bind(contact.custom_datetime_1)
        .bind(contact.custom_datetime_2)
        .bind(contact.custom_datetime_3)
        .bind(contact.custom_datetime_4)
        .bind(contact.custom_datetime_5)
        .bind(json_slots[0].as_deref())
        .bind(json_slots[1].as_deref())
        .bind(json_slots[2].as_deref())
        .bind(json_slots[3].as_deref())
        .bind(json_slots[4].as_deref())
}

/// Escape LIKE metacharacters so a user-supplied pattern matches literally.
fn escape_like(pattern: &str) -> String {
    pattern
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn excluded_statuses() -> Vec<String> {
    MembershipStatus::EXCLUDED_FROM_BROADCASTS
        .iter()
        .map(|s| s.as_str().to_string())
        .collect()
}

/// FROM/WHERE section shared by resolve and count so the two can never
/// diverge. The caller supplies the SELECT head and the tail (ordering,
/// limit/offset) appropriate to its shape.
fn build_audience_query(head: String, audience: &AudienceSettings) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(head);

    if audience.list_ids.is_empty() {
        // Whole-workspace broadcast: every contact, no membership join.
        qb.push(" FROM contacts c");
        if audience.exclude_unsubscribed {
            qb.push(
                " WHERE NOT EXISTS (SELECT 1 FROM contact_lists cl \
                 WHERE cl.contact_email = c.email AND cl.deleted_at IS NULL \
                 AND cl.status = ANY(",
            );
            qb.push_bind(excluded_statuses());
            qb.push("))");
        }
    } else {
        qb.push(
            " FROM contacts c \
             JOIN contact_lists cl ON cl.contact_email = c.email \
             WHERE cl.deleted_at IS NULL AND cl.list_id = ANY(",
        );
        qb.push_bind(
            audience
                .list_ids
                .iter()
                .map(|list| list.0)
                .collect::<Vec<Uuid>>(),
        );
        qb.push(")");
        if audience.exclude_unsubscribed {
            qb.push(" AND cl.status <> ALL(");
            qb.push_bind(excluded_statuses());
            qb.push(")");
        }
    }

    qb
}

#[async_trait::async_trait]
impl ContactStore for PostgresContactStore {
    // ──────────────────────────────────── Contacts ────────────────────────────────────

    async fn upsert_contact(
        &self,
        workspace: &WorkspaceId,
        params: UpsertContactParams,
    ) -> Result<bool, StoreError> {
        let pool = self.router.pool(workspace).await?;
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        // Row lock on the email serializes concurrent upserts of the same
        // contact; the second writer sees the first's committed row as its
        // baseline. Dropping the transaction on any error path rolls back.
        let select = format!("SELECT {CONTACT_COLUMNS} FROM contacts c WHERE c.email = $1 FOR UPDATE");
        let existing = sqlx::query_as::<_, ContactRow>(&select)
            .bind(&params.email)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let now = Utc::now();
        let is_new = existing.is_none();

        match existing {
            None => {
                let contact = params.into_new_contact(now);
                let json_slots = encode_json_slots(&contact)?;
                bind_contact_fields(
                    sqlx::query(INSERT_CONTACT).bind(&contact.email),
                    &contact,
                    &json_slots,
                )
                .bind(contact.created_at)
                .bind(contact.updated_at)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    let s = e.to_string();
                    if s.contains("duplicate key") || s.contains("unique constraint") {
                        StoreError::AlreadyExists
                    } else {
                        StoreError::Backend(s)
                    }
                })?;
            }
            Some(row) => {
                let merged = params.merge_into(row.into_contact()?, now);
                let json_slots = encode_json_slots(&merged)?;
                bind_contact_fields(sqlx::query(UPDATE_CONTACT), &merged, &json_slots)
                    .bind(merged.updated_at)
                    .bind(&merged.email)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        tracing::debug!(is_new, "contact upserted");
        Ok(is_new)
    }

    async fn get_contact_by_email(
        &self,
        workspace: &WorkspaceId,
        email: &str,
    ) -> Result<Contact, StoreError> {
        let pool = self.router.pool(workspace).await?;

        let select = format!("SELECT {CONTACT_COLUMNS} FROM contacts c WHERE c.email = $1");
        sqlx::query_as::<_, ContactRow>(&select)
            .bind(email)
            .fetch_optional(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .ok_or(StoreError::NotFound)?
            .into_contact()
    }

    async fn list_contacts(
        &self,
        workspace: &WorkspaceId,
        filters: &ContactFilters,
        cursor: Option<&str>,
        limit: i64,
    ) -> Result<ContactPage, StoreError> {
        let pool = self.router.pool(workspace).await?;
        let cursor = cursor.map(Cursor::decode).transpose()?;
        let limit = limit.max(1);

        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {CONTACT_COLUMNS} FROM contacts c"));
        let mut sep = " WHERE ";

        if let Some(pattern) = &filters.email {
            qb.push(sep);
            sep = " AND ";
            qb.push("c.email ILIKE ");
            qb.push_bind(format!("%{}%", escape_like(pattern)));
        }
        if let Some(external_id) = &filters.external_id {
            qb.push(sep);
            sep = " AND ";
            qb.push("c.external_id = ");
            qb.push_bind(external_id.clone());
        }
        if let Some(list_id) = &filters.list_id {
            qb.push(sep);
            sep = " AND ";
            qb.push(
                "EXISTS (SELECT 1 FROM contact_lists cl \
                 WHERE cl.contact_email = c.email AND cl.list_id = ",
            );
            qb.push_bind(list_id.0);
            qb.push(" AND cl.deleted_at IS NULL)");
        }
        if let Some(cursor) = &cursor {
            // Strict continuation matching ORDER BY (created_at DESC, email ASC).
            qb.push(sep);
            qb.push("(c.created_at < ");
            qb.push_bind(cursor.timestamp);
            qb.push(" OR (c.created_at = ");
            qb.push_bind(cursor.timestamp);
            qb.push(" AND c.email > ");
            qb.push_bind(cursor.tiebreaker.clone());
            qb.push("))");
        }

        // One extra row detects a further page without a second round trip.
        qb.push(" ORDER BY c.created_at DESC, c.email ASC LIMIT ");
        qb.push_bind(limit + 1);

        let rows = qb
            .build_query_as::<ContactRow>()
            .fetch_all(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut contacts = rows
            .into_iter()
            .map(ContactRow::into_contact)
            .collect::<Result<Vec<_>, _>>()?;

        let next_cursor = if contacts.len() as i64 > limit {
            contacts.truncate(limit as usize);
            contacts
                .last()
                .map(|c| Cursor::new(c.created_at, c.email.as_str()).encode())
        } else {
            None
        };

        let contacts = if filters.with_memberships && !contacts.is_empty() {
            // Second query scoped to exactly the page's emails.
            let emails: Vec<String> = contacts.iter().map(|c| c.email.clone()).collect();
            let rows = sqlx::query_as::<_, MembershipRow>(
                "SELECT contact_email, list_id, status, created_at, updated_at, deleted_at \
                 FROM contact_lists \
                 WHERE contact_email = ANY($1) AND deleted_at IS NULL \
                 ORDER BY created_at DESC",
            )
            .bind(emails)
            .fetch_all(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

            let mut by_email: HashMap<String, Vec<ContactListMembership>> = HashMap::new();
            for row in rows {
                let membership = row.into_membership()?;
                by_email
                    .entry(membership.contact_email.clone())
                    .or_default()
                    .push(membership);
            }

            contacts
                .into_iter()
                .map(|contact| {
                    let lists = by_email.remove(&contact.email).unwrap_or_default();
                    ContactWithLists { contact, lists }
                })
                .collect()
        } else {
            contacts
                .into_iter()
                .map(|contact| ContactWithLists {
                    contact,
                    lists: vec![],
                })
                .collect()
        };

        Ok(ContactPage {
            contacts,
            next_cursor,
        })
    }

    async fn delete_contact(
        &self,
        workspace: &WorkspaceId,
        email: &str,
    ) -> Result<(), StoreError> {
        let pool = self.router.pool(workspace).await?;

        let result = sqlx::query("DELETE FROM contacts WHERE email = $1")
            .bind(email)
            .execute(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    // ─────────────────────────────── List memberships ─────────────────────────────────

    async fn upsert_list_membership(
        &self,
        workspace: &WorkspaceId,
        email: &str,
        list_id: &ListId,
        status: MembershipStatus,
    ) -> Result<(), StoreError> {
        let pool = self.router.pool(workspace).await?;

        sqlx::query(
            "INSERT INTO contact_lists(contact_email, list_id, status) VALUES($1, $2, $3) \
             ON CONFLICT(contact_email, list_id) \
             DO UPDATE SET status = EXCLUDED.status, updated_at = NOW(), deleted_at = NULL",
        )
        .bind(email)
        .bind(list_id.0)
        .bind(status.as_str())
        .execute(&pool)
        .await
        .map_err(|e| {
            let s = e.to_string();
            if s.contains("foreign key") {
                StoreError::NotFound
            } else {
                StoreError::Backend(s)
            }
        })?;

        Ok(())
    }

    async fn remove_list_membership(
        &self,
        workspace: &WorkspaceId,
        email: &str,
        list_id: &ListId,
    ) -> Result<(), StoreError> {
        let pool = self.router.pool(workspace).await?;

        let result = sqlx::query(
            "UPDATE contact_lists SET deleted_at = NOW(), updated_at = NOW() \
             WHERE contact_email = $1 AND list_id = $2 AND deleted_at IS NULL",
        )
        .bind(email)
        .bind(list_id.0)
        .execute(&pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn list_memberships(
        &self,
        workspace: &WorkspaceId,
        email: &str,
    ) -> Result<Vec<ContactListMembership>, StoreError> {
        let pool = self.router.pool(workspace).await?;

        let rows = sqlx::query_as::<_, MembershipRow>(
            "SELECT contact_email, list_id, status, created_at, updated_at, deleted_at \
             FROM contact_lists \
             WHERE contact_email = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC",
        )
        .bind(email)
        .fetch_all(&pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        rows.into_iter().map(MembershipRow::into_membership).collect()
    }

    // ─────────────────────────────── Broadcast audience ───────────────────────────────

    async fn resolve_broadcast_audience(
        &self,
        workspace: &WorkspaceId,
        audience: &AudienceSettings,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<AudienceMember>, StoreError> {
        if !audience.segment_ids.is_empty() {
            return Err(StoreError::Unimplemented("segment targeting"));
        }
        let pool = self.router.pool(workspace).await?;

        let head = if audience.list_ids.is_empty() {
            format!("SELECT {CONTACT_COLUMNS}, NULL::uuid AS matched_list_id")
        } else if audience.skip_duplicate_emails {
            // Keep-first dedup is only well-defined because the sort order
            // starts with the identity key.
            format!("SELECT DISTINCT ON (c.email) {CONTACT_COLUMNS}, cl.list_id AS matched_list_id")
        } else {
            format!("SELECT {CONTACT_COLUMNS}, cl.list_id AS matched_list_id")
        };

        let mut qb = build_audience_query(head, audience);
        if audience.list_ids.is_empty() {
            qb.push(" ORDER BY c.email ASC");
        } else {
            qb.push(" ORDER BY c.email ASC, cl.list_id ASC");
        }
        if let Some(limit) = limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit);
        }
        if offset > 0 {
            qb.push(" OFFSET ");
            qb.push_bind(offset);
        }

        let rows = qb
            .build_query_as::<AudienceRow>()
            .fetch_all(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                Ok(AudienceMember {
                    contact: row.contact.into_contact()?,
                    matched_list_id: row.matched_list_id.map(ListId),
                })
            })
            .collect()
    }

    async fn count_broadcast_audience(
        &self,
        workspace: &WorkspaceId,
        audience: &AudienceSettings,
    ) -> Result<i64, StoreError> {
        if !audience.segment_ids.is_empty() {
            return Err(StoreError::Unimplemented("segment targeting"));
        }
        let pool = self.router.pool(workspace).await?;

        let head = if audience.skip_duplicate_emails && !audience.list_ids.is_empty() {
            "SELECT COUNT(DISTINCT c.email)".to_string()
        } else {
            "SELECT COUNT(*)".to_string()
        };

        let mut qb = build_audience_query(head, audience);
        qb.build_query_scalar::<i64>()
            .fetch_one(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}
