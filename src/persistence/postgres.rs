//! PostgreSQL implementation of the slot store.
//!
//! Each write runs in its own transaction. Rows are re-read with
//! `SELECT … FOR UPDATE` before the domain checks run; slots are always
//! locked in ascending id order, and a response locks its swap request row
//! before its slots. Returning early with an error drops the transaction,
//! which rolls it back.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::models::{PROPOSAL_COLUMNS, ProposalRow, SLOT_COLUMNS, SlotRow};
use super::{
    ProposalFilter, ProposalRole, SlotFilter, SlotStore, SlotUpdate, SwapResolution, vanished_slot,
};
use crate::config::ServiceConfig;
use crate::domain::{
    ProposalId, Slot, SlotId, SlotStatus, SwapDecision, SwapProposal, UserId,
};
use crate::error::SwapError;

/// PostgreSQL-backed slot store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized from `config` and applies the bundled
    /// migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`SwapError::Persistence`] if the database is unreachable
    /// or a migration fails.
    pub async fn connect(config: &ServiceConfig) -> Result<Self, SwapError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.database_connect_timeout_secs,
            ))
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| SwapError::Persistence(e.to_string()))?;
        tracing::info!("database migrations applied");

        Ok(Self::new(pool))
    }
}

/// Locks the given slots in ascending id order and returns those that exist.
async fn lock_slots(
    conn: &mut PgConnection,
    ids: &[SlotId],
) -> Result<HashMap<SlotId, Slot>, SwapError> {
    let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
    let query =
        format!("SELECT {SLOT_COLUMNS} FROM slots WHERE id = ANY($1) ORDER BY id FOR UPDATE");
    let rows = sqlx::query_as::<_, SlotRow>(&query)
        .bind(ids)
        .fetch_all(conn)
        .await?;

    rows.into_iter()
        .map(|row| Slot::try_from(row).map(|slot| (slot.id(), slot)))
        .collect()
}

async fn write_slot(conn: &mut PgConnection, slot: &Slot) -> Result<(), SwapError> {
    sqlx::query("UPDATE slots SET status = $2, owner_id = $3, updated_at = $4 WHERE id = $1")
        .bind(slot.id().as_uuid())
        .bind(slot.status().as_str())
        .bind(slot.owner_id().as_uuid())
        .bind(slot.updated_at())
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl SlotStore for PostgresStore {
    async fn insert_slot(&self, slot: Slot) -> Result<Slot, SwapError> {
        sqlx::query(
            "INSERT INTO slots (id, title, start_time, end_time, status, owner_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(slot.id().as_uuid())
        .bind(slot.title())
        .bind(slot.start_time())
        .bind(slot.end_time())
        .bind(slot.status().as_str())
        .bind(slot.owner_id().as_uuid())
        .bind(slot.created_at())
        .bind(slot.updated_at())
        .execute(&self.pool)
        .await?;
        Ok(slot)
    }

    async fn get_slot(&self, id: SlotId) -> Result<Option<Slot>, SwapError> {
        let query = format!("SELECT {SLOT_COLUMNS} FROM slots WHERE id = $1");
        sqlx::query_as::<_, SlotRow>(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(Slot::try_from)
            .transpose()
    }

    async fn list_slots(&self, filter: &SlotFilter) -> Result<Vec<Slot>, SwapError> {
        let query = format!(
            "SELECT {SLOT_COLUMNS} FROM slots \
             WHERE ($1::uuid IS NULL OR owner_id = $1) \
               AND ($2::uuid IS NULL OR owner_id <> $2) \
               AND ($3::text IS NULL OR status = $3) \
             ORDER BY start_time ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, SlotRow>(&query)
            .bind(filter.owner.map(Uuid::from))
            .bind(filter.exclude_owner.map(Uuid::from))
            .bind(filter.status.map(SlotStatus::as_str))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Slot::try_from).collect()
    }

    async fn update_slot_status(
        &self,
        actor: UserId,
        id: SlotId,
        status: SlotStatus,
    ) -> Result<SlotUpdate, SwapError> {
        let mut tx = self.pool.begin().await?;
        let mut slot = lock_slots(&mut tx, &[id])
            .await?
            .remove(&id)
            .ok_or(SwapError::SlotNotFound(id))?;

        let previous = slot.status();
        if slot.change_status_by_owner(actor, status)? {
            write_slot(&mut tx, &slot).await?;
        }
        tx.commit().await?;
        Ok(SlotUpdate { previous, slot })
    }

    async fn delete_slot(&self, actor: UserId, id: SlotId) -> Result<Slot, SwapError> {
        let mut tx = self.pool.begin().await?;
        let slot = lock_slots(&mut tx, &[id])
            .await?
            .remove(&id)
            .ok_or(SwapError::SlotNotFound(id))?;
        slot.ensure_deletable_by(actor)?;

        sqlx::query("DELETE FROM slots WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(slot)
    }

    async fn propose_swap(
        &self,
        requester: UserId,
        my_slot_id: SlotId,
        their_slot_id: SlotId,
    ) -> Result<SwapProposal, SwapError> {
        SwapProposal::validate_pair(my_slot_id, their_slot_id)?;

        let mut tx = self.pool.begin().await?;
        let mut slots = lock_slots(&mut tx, &[my_slot_id, their_slot_id]).await?;
        let mut mine = slots
            .remove(&my_slot_id)
            .ok_or(SwapError::SlotNotFound(my_slot_id))?;
        let mut theirs = slots
            .remove(&their_slot_id)
            .ok_or(SwapError::SlotNotFound(their_slot_id))?;

        let proposal = SwapProposal::open(requester, &mut mine, &mut theirs)?;

        sqlx::query(
            "INSERT INTO swap_requests \
             (id, my_slot_id, their_slot_id, requester_id, receiver_id, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(proposal.id().as_uuid())
        .bind(proposal.my_slot_id().as_uuid())
        .bind(proposal.their_slot_id().as_uuid())
        .bind(proposal.requester_id().as_uuid())
        .bind(proposal.receiver_id().as_uuid())
        .bind(proposal.status().as_str())
        .bind(proposal.created_at())
        .bind(proposal.updated_at())
        .execute(&mut *tx)
        .await?;
        write_slot(&mut tx, &mine).await?;
        write_slot(&mut tx, &theirs).await?;

        tx.commit().await?;
        Ok(proposal)
    }

    async fn respond_to_swap(
        &self,
        responder: UserId,
        proposal_id: ProposalId,
        decision: SwapDecision,
    ) -> Result<SwapResolution, SwapError> {
        let mut tx = self.pool.begin().await?;

        let query = format!("SELECT {PROPOSAL_COLUMNS} FROM swap_requests WHERE id = $1 FOR UPDATE");
        let mut proposal: SwapProposal = sqlx::query_as::<_, ProposalRow>(&query)
            .bind(proposal_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(SwapError::ProposalNotFound(proposal_id))?
            .try_into()?;
        proposal.ensure_respondable_by(responder)?;

        let mut slots =
            lock_slots(&mut tx, &[proposal.my_slot_id(), proposal.their_slot_id()]).await?;
        let mut mine = slots
            .remove(&proposal.my_slot_id())
            .ok_or_else(|| vanished_slot(&proposal, proposal.my_slot_id()))?;
        let mut theirs = slots
            .remove(&proposal.their_slot_id())
            .ok_or_else(|| vanished_slot(&proposal, proposal.their_slot_id()))?;

        proposal.respond(responder, decision, &mut mine, &mut theirs)?;

        sqlx::query("UPDATE swap_requests SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(proposal.id().as_uuid())
            .bind(proposal.status().as_str())
            .bind(proposal.updated_at())
            .execute(&mut *tx)
            .await?;
        write_slot(&mut tx, &mine).await?;
        write_slot(&mut tx, &theirs).await?;

        tx.commit().await?;
        Ok(SwapResolution {
            proposal,
            my_slot: mine,
            their_slot: theirs,
        })
    }

    async fn get_proposal(&self, id: ProposalId) -> Result<Option<SwapProposal>, SwapError> {
        let query = format!("SELECT {PROPOSAL_COLUMNS} FROM swap_requests WHERE id = $1");
        sqlx::query_as::<_, ProposalRow>(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(SwapProposal::try_from)
            .transpose()
    }

    async fn list_proposals(
        &self,
        filter: &ProposalFilter,
    ) -> Result<Vec<SwapProposal>, SwapError> {
        let side = match filter.role {
            ProposalRole::Incoming => "receiver_id = $1",
            ProposalRole::Outgoing => "requester_id = $1",
            ProposalRole::Any => "(requester_id = $1 OR receiver_id = $1)",
        };
        let query = format!(
            "SELECT {PROPOSAL_COLUMNS} FROM swap_requests \
             WHERE {side} AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, ProposalRow>(&query)
            .bind(filter.participant.as_uuid())
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(SwapProposal::try_from).collect()
    }

    async fn ping(&self) -> Result<(), SwapError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
