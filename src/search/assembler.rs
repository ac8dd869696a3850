//! Turns a ranked hit list into the final search outcome.

use rayon::prelude::*;

use crate::error::Result;
use crate::graph::backend::GraphBackend;
use crate::graph::relations::RelationshipResolver;
use crate::search::projector::{project, ProjectionContext};
use crate::types::{ScoredEntity, SearchResult};

/// Maximum number of ranked hits considered per search.
pub const RESULT_LIMIT: usize = 10;

/// Result of one search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The indexes matched nothing at all.
    NoResults,
    /// Projected results in rank order. May be empty when every top-ranked
    /// hit was of an unrecognized kind.
    Results(Vec<SearchResult>),
}

impl SearchOutcome {
    pub fn results(&self) -> &[SearchResult] {
        match self {
            Self::NoResults => &[],
            Self::Results(results) => results,
        }
    }

    pub fn is_no_results(&self) -> bool {
        matches!(self, Self::NoResults)
    }
}

/// Truncate to [`RESULT_LIMIT`], then project each hit in order.
///
/// Truncation happens before projection, so a dropped entity inside the top
/// ten is not back-filled from lower-ranked hits.
pub fn assemble<B: GraphBackend + ?Sized>(
    mut ranked: Vec<ScoredEntity>,
    resolver: &RelationshipResolver<'_, B>,
    ctx: &ProjectionContext,
) -> Result<SearchOutcome> {
    if ranked.is_empty() {
        return Ok(SearchOutcome::NoResults);
    }
    ranked.truncate(RESULT_LIMIT);

    let mut results = Vec::with_capacity(ranked.len());
    for hit in &ranked {
        if let Some(result) = project(&hit.entity, resolver, ctx)? {
            results.push(result);
        }
    }
    Ok(SearchOutcome::Results(results))
}

/// Same as [`assemble`], projecting the hits on the rayon pool.
/// Output order matches input order.
pub fn assemble_par<B: GraphBackend + Sync + ?Sized>(
    mut ranked: Vec<ScoredEntity>,
    resolver: &RelationshipResolver<'_, B>,
    ctx: &ProjectionContext,
) -> Result<SearchOutcome> {
    if ranked.is_empty() {
        return Ok(SearchOutcome::NoResults);
    }
    ranked.truncate(RESULT_LIMIT);

    let projected: Vec<Option<SearchResult>> = ranked
        .par_iter()
        .map(|hit| project(&hit.entity, resolver, ctx))
        .collect::<Result<_>>()?;
    Ok(SearchOutcome::Results(projected.into_iter().flatten().collect()))
}
