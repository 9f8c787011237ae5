//! Write-only audit trail.

use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use uuid::Uuid;

use freightbook_core::audit::AuditEntry;
use freightbook_shared::clock::to_millis;
use freightbook_shared::types::UserId;

use crate::entities::audit_log;
use crate::repositories::RepositoryError;

/// Appends an audit entry on the given connection or transaction.
///
/// # Errors
///
/// Returns an error if the payload cannot be serialized or the insert fails.
pub async fn record<C: ConnectionTrait>(
    conn: &C,
    entry: &AuditEntry,
) -> Result<(), RepositoryError> {
    let created_at = to_millis(entry.created_at);
    audit_log::ActiveModel {
        id: Set(Uuid::now_v7()),
        entity_type: Set(entry.entity_type.as_str().to_string()),
        entity_id: Set(entry.entity_id),
        event: Set(entry.event.name().to_string()),
        payload: Set(entry.payload()?),
        actor_id: Set(entry.actor_id.map(UserId::into_inner)),
        created_at: Set(created_at),
        updated_at: Set(created_at),
        deleted_at: Set(None),
    }
    .insert(conn)
    .await?;

    tracing::debug!(
        entity_type = entry.entity_type.as_str(),
        entity_id = %entry.entity_id,
        event = entry.event.name(),
        "Audit entry recorded"
    );
    Ok(())
}
