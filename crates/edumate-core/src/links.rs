//! Parent/teacher ↔ student link reconciliation.
//!
//! Links are stored on both users. Saving a user's link list also adds the
//! inverse link to every newly linked user, restores missing inverse links on
//! kept ones, and removes it from users that were unlinked. All touched users
//! are written in a single batch.

use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, StoreError};
use crate::model::{Role, User};
use crate::traits::Store;

/// What a link save changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkReport {
    pub added: Vec<Uuid>,
    pub removed: Vec<Uuid>,
    /// Kept links whose inverse side was missing and has been restored.
    pub repaired: Vec<Uuid>,
}

/// Whether two roles may be linked: exactly one student and one supervisor.
pub fn can_link(a: Role, b: Role) -> bool {
    (a == Role::Student && b.supervises_students()) || (b == Role::Student && a.supervises_students())
}

/// Compute the users to write when `owner` ends up linked to exactly `desired`.
///
/// Returns the updated owner first, followed by every other user whose link
/// list changed, along with the report.
pub fn plan_links(
    owner: &User,
    users: &HashMap<Uuid, User>,
    desired: &[Uuid],
) -> Result<(Vec<User>, LinkReport)> {
    let desired: BTreeSet<Uuid> = desired.iter().copied().filter(|id| *id != owner.id).collect();
    let current: BTreeSet<Uuid> = owner.linked_ids.iter().copied().collect();

    for id in &desired {
        let other = users
            .get(id)
            .ok_or_else(|| StoreError::not_found("user", *id))?;
        if !can_link(owner.role, other.role) {
            return Err(DomainError::IncompatibleLink {
                from: owner.id,
                from_role: owner.role,
                to: other.id,
                to_role: other.role,
            }
            .into());
        }
    }

    let mut report = LinkReport::default();
    let mut updates = Vec::new();

    let mut updated_owner = owner.clone();
    updated_owner.linked_ids = desired.iter().copied().collect();
    updates.push(updated_owner);

    for id in &desired {
        let Some(other) = users.get(id) else { continue };
        if other.is_linked_to(owner.id) {
            continue;
        }
        let mut other = other.clone();
        other.linked_ids.push(owner.id);
        updates.push(other);
        if current.contains(id) {
            report.repaired.push(*id);
        } else {
            report.added.push(*id);
        }
    }
    for id in desired.difference(&current) {
        if !report.added.contains(id) {
            report.added.push(*id);
        }
    }

    for id in current.difference(&desired) {
        report.removed.push(*id);
        let Some(other) = users.get(id) else { continue };
        if other.is_linked_to(owner.id) {
            let mut other = other.clone();
            other.linked_ids.retain(|l| *l != owner.id);
            updates.push(other);
        }
    }

    Ok((updates, report))
}

/// Replace a user's links and reconcile the other side in one batch write.
pub async fn save_links(store: &dyn Store, user_id: Uuid, desired: &[Uuid]) -> Result<LinkReport> {
    let users: HashMap<Uuid, User> = store
        .list_users()
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let owner = users
        .get(&user_id)
        .ok_or_else(|| StoreError::not_found("user", user_id))?;

    let (updates, report) = plan_links(owner, &users, desired)?;
    store.save_users(&updates).await?;

    tracing::info!(
        "links for {user_id}: {} added, {} removed, {} repaired",
        report.added.len(),
        report.removed.len(),
        report.repaired.len()
    );
    Ok(report)
}
