//! Reward redemption workflow.
//!
//! Parents define rewards with a coin cost. A student asks for one, which
//! creates a pending request; a parent (or admin) approves it, deducting the
//! coins, or rejects it, leaving the balance alone.

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::error::DomainError;
use crate::model::{PointCategory, RequestStatus, Reward, RewardRequest, Role};
use crate::points::{credit, ensure_student, AwardOutcome, PointsCalculation};
use crate::traits::{LedgerRecord, Store};

/// Define a new reward owned by a parent.
pub async fn create_reward(
    store: &dyn Store,
    parent_id: Uuid,
    name: &str,
    cost: i64,
) -> Result<Reward> {
    anyhow::ensure!(cost > 0, "reward cost must be positive");
    anyhow::ensure!(!name.trim().is_empty(), "reward name must not be empty");

    let parent = store.get_user(parent_id).await?;
    if !matches!(parent.role, Role::Parent | Role::Admin) {
        return Err(DomainError::WrongRole {
            id: parent.id,
            expected: Role::Parent,
            actual: parent.role,
        }
        .into());
    }

    let reward = Reward {
        id: Uuid::new_v4(),
        parent_id,
        name: name.trim().to_string(),
        cost,
        active: true,
    };
    store.save_reward(&reward).await?;
    tracing::info!("reward '{}' created for {} coins", reward.name, reward.cost);
    Ok(reward)
}

/// Ask for a reward. The balance must already cover its cost.
pub async fn request_reward(
    store: &dyn Store,
    student_id: Uuid,
    reward_id: Uuid,
) -> Result<RewardRequest> {
    let student = store.get_user(student_id).await?;
    ensure_student(&student)?;

    let reward = store.get_reward(reward_id).await?;
    if !reward.active {
        return Err(DomainError::RewardInactive(reward_id).into());
    }
    if student.coins < reward.cost {
        return Err(DomainError::InsufficientCoins {
            needed: reward.cost,
            available: student.coins,
        }
        .into());
    }

    let request = RewardRequest {
        id: Uuid::new_v4(),
        student_id,
        reward_id,
        cost: reward.cost,
        status: RequestStatus::Pending,
        requested_at: Utc::now(),
        resolved_at: None,
        resolved_by: None,
    };
    store.save_reward_request(&request).await?;
    tracing::info!("{} requested '{}'", student.name, reward.name);
    Ok(request)
}

/// Approve a pending request and deduct its cost from the student.
pub async fn approve_request(
    store: &dyn Store,
    request_id: Uuid,
    approver_id: Uuid,
) -> Result<(RewardRequest, AwardOutcome)> {
    let mut request = pending_request(store, request_id).await?;
    ensure_approver(store, approver_id).await?;

    let student = store.get_user(request.student_id).await?;
    if student.coins < request.cost {
        return Err(DomainError::InsufficientCoins {
            needed: request.cost,
            available: student.coins,
        }
        .into());
    }

    let reward_name = store
        .get_reward(request.reward_id)
        .await
        .map(|r| r.name)
        .unwrap_or_else(|_| "reward".to_string());

    request.status = RequestStatus::Approved;
    request.resolved_at = Some(Utc::now());
    request.resolved_by = Some(approver_id);

    let outcome = credit(
        store,
        student.coins,
        student.id,
        PointCategory::Manual,
        &format!("Redeemed: {reward_name}"),
        PointsCalculation {
            points: -request.cost,
            breakdown: vec![format!("Reward redemption: -{}", request.cost)],
        },
        Utc::now(),
        Some(LedgerRecord::RewardRequest(request.clone())),
    )
    .await?;

    Ok((request, outcome))
}

/// Reject a pending request. No coins move.
pub async fn reject_request(
    store: &dyn Store,
    request_id: Uuid,
    approver_id: Uuid,
) -> Result<RewardRequest> {
    let mut request = pending_request(store, request_id).await?;
    ensure_approver(store, approver_id).await?;

    request.status = RequestStatus::Rejected;
    request.resolved_at = Some(Utc::now());
    request.resolved_by = Some(approver_id);
    store.save_reward_request(&request).await?;
    tracing::info!("reward request {request_id} rejected");
    Ok(request)
}

/// Requests still waiting for a decision, oldest first.
pub async fn pending_requests(store: &dyn Store) -> Result<Vec<RewardRequest>> {
    let mut requests: Vec<_> = store
        .list_reward_requests()
        .await?
        .into_iter()
        .filter(|r| r.status == RequestStatus::Pending)
        .collect();
    requests.sort_by_key(|r| r.requested_at);
    Ok(requests)
}

async fn pending_request(store: &dyn Store, request_id: Uuid) -> Result<RewardRequest> {
    let request = store.get_reward_request(request_id).await?;
    if request.status != RequestStatus::Pending {
        return Err(DomainError::AlreadyResolved(request_id).into());
    }
    Ok(request)
}

async fn ensure_approver(store: &dyn Store, approver_id: Uuid) -> Result<()> {
    let approver = store.get_user(approver_id).await?;
    match approver.role {
        Role::Parent | Role::Admin => Ok(()),
        Role::Teacher | Role::Student => Err(DomainError::WrongRole {
            id: approver.id,
            expected: Role::Parent,
            actual: approver.role,
        }
        .into()),
    }
}
