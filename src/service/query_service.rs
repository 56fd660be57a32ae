//! Read-only views for the calling user.

use std::sync::Arc;

use crate::domain::{ProposalId, Slot, SwapProposal, SwapStatus, UserId};
use crate::error::SwapError;
use crate::persistence::{ProposalFilter, ProposalRole, SlotFilter, SlotStore};
use crate::service::{Page, PageRequest};

/// A user's slots together with their pending proposal counts.
#[derive(Debug, Clone)]
pub struct Dashboard {
    /// The user the dashboard belongs to.
    pub user_id: UserId,
    /// All slots the user owns, ordered by start time.
    pub slots: Vec<Slot>,
    /// Pending proposals waiting for the user's answer.
    pub incoming_pending: usize,
    /// Pending proposals the user has sent.
    pub outgoing_pending: usize,
}

/// Queries scoped to the calling user.
#[derive(Debug, Clone)]
pub struct QueryService {
    store: Arc<dyn SlotStore>,
}

impl QueryService {
    /// Creates a new `QueryService`.
    #[must_use]
    pub fn new(store: Arc<dyn SlotStore>) -> Self {
        Self { store }
    }

    /// All slots owned by `user`, any status, ordered by start time.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::Persistence`] if the store is unavailable.
    pub async fn my_slots(&self, user: UserId) -> Result<Vec<Slot>, SwapError> {
        self.store.list_slots(&SlotFilter::owned_by(user)).await
    }

    /// Proposals `user` takes part in, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::Persistence`] if the store is unavailable.
    pub async fn my_proposals(
        &self,
        user: UserId,
        role: ProposalRole,
        status: Option<SwapStatus>,
        page: PageRequest,
    ) -> Result<Page<SwapProposal>, SwapError> {
        let filter = ProposalFilter {
            participant: user,
            role,
            status,
        };
        Ok(page.slice(self.store.list_proposals(&filter).await?))
    }

    /// A single proposal, visible only to its requester and receiver.
    ///
    /// # Errors
    ///
    /// - [`SwapError::ProposalNotFound`] if it does not exist.
    /// - [`SwapError::Forbidden`] if `user` is not a party to it.
    pub async fn get_proposal(
        &self,
        user: UserId,
        id: ProposalId,
    ) -> Result<SwapProposal, SwapError> {
        let proposal = self
            .store
            .get_proposal(id)
            .await?
            .ok_or(SwapError::ProposalNotFound(id))?;
        if !proposal.involves(user) {
            return Err(SwapError::Forbidden(format!(
                "swap request {id} belongs to other users"
            )));
        }
        Ok(proposal)
    }

    /// The user's slots and pending proposal counts.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::Persistence`] if the store is unavailable.
    pub async fn dashboard(&self, user: UserId) -> Result<Dashboard, SwapError> {
        let slots = self.my_slots(user).await?;
        let pending = self
            .store
            .list_proposals(&ProposalFilter {
                participant: user,
                role: ProposalRole::Any,
                status: Some(SwapStatus::Pending),
            })
            .await?;
        let incoming_pending = pending.iter().filter(|p| p.receiver_id() == user).count();

        Ok(Dashboard {
            user_id: user,
            slots,
            incoming_pending,
            outgoing_pending: pending.len() - incoming_pending,
        })
    }
}
