use std::sync::Arc;

use crate::domain::entities::filters::{FilterOverrides, FilterState};
use crate::domain::error::FilterError;
use crate::usecase::sequencer::{RequestSequencer, RequestToken};
use crate::usecase::services::query_service::QueryService;
use crate::usecase::state::PreviewCompletion;

/// A validated request snapshot holding its sequence token.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewTicket {
    pub token: RequestToken,
    pub snapshot: FilterState,
    pub overrides: FilterOverrides,
}

pub struct PreviewService {
    query: Arc<QueryService>,
    sequencer: Arc<RequestSequencer>,
}

impl PreviewService {
    pub fn new(query: Arc<QueryService>, sequencer: Arc<RequestSequencer>) -> Self {
        Self { query, sequencer }
    }

    /// Validates the effective snapshot and takes a token for it. Must be called
    /// before the fetch is awaited.
    pub fn begin(
        &self,
        filters: &FilterState,
        overrides: FilterOverrides,
    ) -> Result<PreviewTicket, FilterError> {
        let snapshot = filters.effective(&overrides);
        snapshot.validate()?;
        Ok(PreviewTicket {
            token: self.sequencer.issue(),
            snapshot,
            overrides,
        })
    }

    pub async fn run(&self, ticket: PreviewTicket) -> PreviewCompletion {
        let outcome = self.query.fetch_page(&ticket.snapshot).await;
        PreviewCompletion {
            token: ticket.token,
            snapshot: ticket.snapshot,
            overrides: ticket.overrides,
            outcome,
        }
    }

    pub fn latest(&self) -> RequestToken {
        self.sequencer.latest()
    }
}
