//! Search pipeline: validate, fan out over the name indexes, rank,
//! truncate, and project into result summaries.

pub mod assembler;
pub mod fanout;
pub mod projector;

use chrono::{DateTime, Utc};

use crate::error::{Result, SearchError};
use crate::graph::backend::{FullTextIndex, GraphBackend};
use crate::graph::relations::{LatestCitation, PrimarySourcePolicy, RelationshipResolver};
use crate::types::ScoredEntity;

pub use assembler::{assemble, assemble_par, SearchOutcome, RESULT_LIMIT};
pub use fanout::IndexQueryFanout;
pub use projector::{ProjectionContext, DEFAULT_HREF_PREFIX};

/// Message returned when the query is missing or blank.
pub const QUERY_REQUIRED: &str = "Query parameter is required";

/// Message for a query that matched nothing in any index.
pub const NO_RESULTS: &str = "No results found matching the query";

/// Trim `query` and reject it when nothing is left.
pub fn validate_query(query: Option<&str>) -> Result<&str> {
    match query.map(str::trim) {
        Some(q) if !q.is_empty() => Ok(q),
        _ => Err(SearchError::Validation(QUERY_REQUIRED.to_string())),
    }
}

/// Runs free-text searches against one backend.
///
/// The engine borrows its backend, so a request-scoped store handle can be
/// wrapped cheaply per request.
pub struct SearchEngine<'a, B: ?Sized> {
    backend: &'a B,
    policy: &'a dyn PrimarySourcePolicy,
    fanout: IndexQueryFanout,
    href_prefix: String,
}

impl<'a, B: GraphBackend + FullTextIndex + ?Sized> SearchEngine<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            policy: &LatestCitation,
            fanout: IndexQueryFanout::default(),
            href_prefix: DEFAULT_HREF_PREFIX.to_string(),
        }
    }

    /// Replace the rule that picks an entity's primary source.
    pub fn with_policy(mut self, policy: &'a dyn PrimarySourcePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_href_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.href_prefix = prefix.into();
        self
    }

    /// Search with the current time as the request timestamp.
    pub fn search(&self, query: &str) -> Result<SearchOutcome> {
        self.search_at(query, Utc::now())
    }

    /// Search with an explicit request timestamp, used as the fallback
    /// `last_updated` for agencies and units.
    pub fn search_at(&self, query: &str, requested_at: DateTime<Utc>) -> Result<SearchOutcome> {
        let (ranked, ctx) = self.rank(query, requested_at)?;
        let outcome = assemble(ranked, &self.resolver(), &ctx)?;
        log_outcome(query, &outcome);
        Ok(outcome)
    }

    fn resolver(&self) -> RelationshipResolver<'a, B> {
        RelationshipResolver::new(self.backend, self.policy)
    }

    fn rank(
        &self,
        query: &str,
        requested_at: DateTime<Utc>,
    ) -> Result<(Vec<ScoredEntity>, ProjectionContext)> {
        let query = validate_query(Some(query))?;
        let ranked = self.fanout.run(self.backend, query)?;
        tracing::debug!(query, matches = ranked.len(), "full-text fanout complete");
        Ok((ranked, ProjectionContext::new(requested_at, self.href_prefix.clone())))
    }
}

impl<B: GraphBackend + FullTextIndex + Sync + ?Sized> SearchEngine<'_, B> {
    /// Like [`search`](Self::search), projecting hits in parallel.
    pub fn search_par(&self, query: &str) -> Result<SearchOutcome> {
        self.search_par_at(query, Utc::now())
    }

    pub fn search_par_at(&self, query: &str, requested_at: DateTime<Utc>) -> Result<SearchOutcome> {
        let (ranked, ctx) = self.rank(query, requested_at)?;
        let outcome = assemble_par(ranked, &self.resolver(), &ctx)?;
        log_outcome(query, &outcome);
        Ok(outcome)
    }
}

fn log_outcome(query: &str, outcome: &SearchOutcome) {
    match outcome {
        SearchOutcome::NoResults => tracing::debug!(query, "no matches"),
        SearchOutcome::Results(results) => {
            tracing::debug!(query, results = results.len(), "search complete")
        }
    }
}
