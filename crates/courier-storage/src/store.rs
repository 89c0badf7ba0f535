//! The ContactStore trait that backends implement.

use crate::types::*;
use crate::StoreError;

/// The contact data access core.
///
/// All methods are **scoped by workspace**: the implementation borrows a
/// connection for that workspace from its router for the duration of a single
/// call and never caches it across calls. Methods are independently callable
/// from any number of concurrent tasks; the only cross-call ordering guarantee
/// is the per-email serialization inside [`ContactStore::upsert_contact`].
///
/// Cancellation is future cancellation: dropping an in-flight call aborts the
/// database round trip, and an open upsert transaction rolls back rather than
/// committing partially.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait ContactStore: Send + Sync {
    // ──────────────────────────────────── Contacts ────────────────────────────────────

    /// Insert-or-merge a partial contact record under a per-email row lock.
    /// Returns `true` iff no row existed for the email (insert path).
    async fn upsert_contact(
        &self,
        workspace: &WorkspaceId,
        params: UpsertContactParams,
    ) -> Result<bool, StoreError>;

    /// Get a contact by email. Not-found is a distinguishable error.
    async fn get_contact_by_email(
        &self,
        workspace: &WorkspaceId,
        email: &str,
    ) -> Result<Contact, StoreError>;

    /// List contacts matching `filters`, keyset-paginated. `cursor` is an
    /// opaque token from a previous page's `next_cursor`; `limit` is the page
    /// size.
    async fn list_contacts(
        &self,
        workspace: &WorkspaceId,
        filters: &ContactFilters,
        cursor: Option<&str>,
        limit: i64,
    ) -> Result<ContactPage, StoreError>;

    /// Delete a contact and (by cascade) its memberships.
    async fn delete_contact(&self, workspace: &WorkspaceId, email: &str)
        -> Result<(), StoreError>;

    // ─────────────────────────────── List memberships ─────────────────────────────────

    /// Add the contact to a list, or update the status of an existing
    /// membership. Revives a soft-deleted row.
    async fn upsert_list_membership(
        &self,
        workspace: &WorkspaceId,
        email: &str,
        list_id: &ListId,
        status: MembershipStatus,
    ) -> Result<(), StoreError>;

    /// Soft-delete a membership.
    async fn remove_list_membership(
        &self,
        workspace: &WorkspaceId,
        email: &str,
        list_id: &ListId,
    ) -> Result<(), StoreError>;

    /// Live memberships for a contact, newest first.
    async fn list_memberships(
        &self,
        workspace: &WorkspaceId,
        email: &str,
    ) -> Result<Vec<ContactListMembership>, StoreError>;

    // ─────────────────────────────── Broadcast audience ───────────────────────────────

    /// The ordered, optionally deduplicated set of contacts a broadcast
    /// targets. `limit = None` resolves the whole audience.
    async fn resolve_broadcast_audience(
        &self,
        workspace: &WorkspaceId,
        audience: &AudienceSettings,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<AudienceMember>, StoreError>;

    /// Scalar count under exactly the same predicates as
    /// [`ContactStore::resolve_broadcast_audience`]; the two never diverge.
    async fn count_broadcast_audience(
        &self,
        workspace: &WorkspaceId,
        audience: &AudienceSettings,
    ) -> Result<i64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    // Tiny compile-time smoke test for trait object usage.
    struct NoopStore;

    #[async_trait::async_trait]
    impl ContactStore for NoopStore {
        async fn upsert_contact(
            &self,
            _workspace: &WorkspaceId,
            _params: UpsertContactParams,
        ) -> Result<bool, StoreError> {
            Ok(true)
        }

        async fn get_contact_by_email(
            &self,
            _workspace: &WorkspaceId,
            _email: &str,
        ) -> Result<Contact, StoreError> {
            Err(StoreError::NotFound)
        }

        async fn list_contacts(
            &self,
            _workspace: &WorkspaceId,
            _filters: &ContactFilters,
            _cursor: Option<&str>,
            _limit: i64,
        ) -> Result<ContactPage, StoreError> {
            Ok(ContactPage {
                contacts: vec![],
                next_cursor: None,
            })
        }

        async fn delete_contact(
            &self,
            _workspace: &WorkspaceId,
            _email: &str,
        ) -> Result<(), StoreError> {
            Err(StoreError::NotFound)
        }

        async fn upsert_list_membership(
            &self,
            _workspace: &WorkspaceId,
            _email: &str,
            _list_id: &ListId,
            _status: MembershipStatus,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn remove_list_membership(
            &self,
            _workspace: &WorkspaceId,
            _email: &str,
            _list_id: &ListId,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn list_memberships(
            &self,
            _workspace: &WorkspaceId,
            _email: &str,
        ) -> Result<Vec<ContactListMembership>, StoreError> {
            Ok(vec![])
        }

        async fn resolve_broadcast_audience(
            &self,
            _workspace: &WorkspaceId,
            _audience: &AudienceSettings,
            _limit: Option<i64>,
            _offset: i64,
        ) -> Result<Vec<AudienceMember>, StoreError> {
            Ok(vec![])
        }

        async fn count_broadcast_audience(
            &self,
            _workspace: &WorkspaceId,
            _audience: &AudienceSettings,
        ) -> Result<i64, StoreError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn trait_smoke() {
        let store: &dyn ContactStore = &NoopStore;
        let ws = WorkspaceId(Uuid::new_v4());

        let is_new = store
            .upsert_contact(&ws, UpsertContactParams::new("test@example.com"))
            .await
            .unwrap();
        assert!(is_new);

        let err = store
            .get_contact_by_email(&ws, "test@example.com")
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let page = store
            .list_contacts(&ws, &ContactFilters::default(), None, 25)
            .await
            .unwrap();
        assert!(page.next_cursor.is_none());

        let audience = AudienceSettings::default();
        let resolved = store
            .resolve_broadcast_audience(&ws, &audience, None, 0)
            .await
            .unwrap();
        let count = store.count_broadcast_audience(&ws, &audience).await.unwrap();
        assert_eq!(count as usize, resolved.len());
    }
}
