//! Tolerant relationship resolution over a [`GraphBackend`].
//!
//! Every lookup treats a missing relation, or an edge whose far endpoint no
//! longer exists, as absence rather than an error. Only failures of the
//! backend itself propagate.
//!
//! Relationship vocabulary:
//!
//! | Relation        | edge type        | direction | qualifying edges        |
//! |-----------------|------------------|-----------|-------------------------|
//! | `CurrentUnit`   | `MEMBER_OF_UNIT` | outgoing  | no `latest_date`        |
//! | `UnitAgency`    | `ESTABLISHED_BY` | outgoing  | all                     |
//! | `AgencyUnits`   | `ESTABLISHED_BY` | incoming  | all                     |
//! | `UnitOfficers`  | `MEMBER_OF_UNIT` | incoming  | all                     |
//! | `UnitCommander` | `COMMANDED_BY`   | outgoing  | no `latest_date`        |
//! | `Citations`     | `UPDATED_BY`     | outgoing  | all                     |

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::graph::backend::GraphBackend;
use crate::types::{EdgeRecord, Entity, Properties};

// ---------------------------------------------------------------------------
// Edge types
// ---------------------------------------------------------------------------

/// Officer → Unit membership. Carries `rank`, `earliest_date`, `latest_date`.
pub const MEMBER_OF_UNIT: &str = "MEMBER_OF_UNIT";
/// Unit → Agency.
pub const ESTABLISHED_BY: &str = "ESTABLISHED_BY";
/// Unit → Officer command assignment. Carries `earliest_date`, `latest_date`.
pub const COMMANDED_BY: &str = "COMMANDED_BY";
/// Any entity → Source citation. Carries `date`.
pub const UPDATED_BY: &str = "UPDATED_BY";

/// Edge attribute marking the end of a membership or assignment.
const LATEST_DATE: &str = "latest_date";

// ---------------------------------------------------------------------------
// Relation
// ---------------------------------------------------------------------------

/// A named, directed hop from one entity to its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    CurrentUnit,
    UnitAgency,
    AgencyUnits,
    UnitOfficers,
    UnitCommander,
    Citations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Outgoing,
    Incoming,
}

impl Relation {
    /// Stored edge type backing this relation.
    pub fn rel_type(&self) -> &'static str {
        match self {
            Self::CurrentUnit | Self::UnitOfficers => MEMBER_OF_UNIT,
            Self::UnitAgency | Self::AgencyUnits => ESTABLISHED_BY,
            Self::UnitCommander => COMMANDED_BY,
            Self::Citations => UPDATED_BY,
        }
    }

    fn direction(&self) -> Direction {
        match self {
            Self::AgencyUnits | Self::UnitOfficers => Direction::Incoming,
            _ => Direction::Outgoing,
        }
    }

    /// Whether only open-ended (still current) edges count.
    fn current_only(&self) -> bool {
        matches!(self, Self::CurrentUnit | Self::UnitCommander)
    }

    fn qualifies(&self, edge: &EdgeRecord) -> bool {
        !self.current_only() || edge.attr_str(LATEST_DATE).is_none()
    }

    /// The uid at the far end of `edge` as seen from this relation's subject.
    fn far_end<'e>(&self, edge: &'e EdgeRecord) -> &'e str {
        match self.direction() {
            Direction::Outgoing => &edge.target,
            Direction::Incoming => &edge.source,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution results
// ---------------------------------------------------------------------------

/// Related entities reached through a to-many relation, deduplicated and
/// ordered by uid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    pub members: Vec<Entity>,
}

impl Collection {
    pub fn count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// One citation: the cited source together with the specific edge citing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Citation {
    pub source: Entity,
    pub edge: EdgeRecord,
}

impl Citation {
    /// The `date` attribute on this citation edge.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.edge.attr_datetime("date")
    }

    /// Display name of the cited source.
    pub fn source_name(&self) -> Option<&str> {
        self.source.prop_str("name")
    }
}

// ---------------------------------------------------------------------------
// Primary source selection
// ---------------------------------------------------------------------------

/// Chooses the one citation that stands for an entity's provenance.
pub trait PrimarySourcePolicy: Send + Sync {
    fn select<'c>(&self, entity: &Entity, citations: &'c [Citation]) -> Option<&'c Citation>;
}

/// Default policy: the most recently dated citation wins. Undated citations
/// rank below dated ones; ties go to the most recently recorded edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatestCitation;

impl PrimarySourcePolicy for LatestCitation {
    fn select<'c>(&self, _entity: &Entity, citations: &'c [Citation]) -> Option<&'c Citation> {
        citations
            .iter()
            .max_by(|a, b| a.date().cmp(&b.date()).then(a.edge.id.cmp(&b.edge.id)))
    }
}

// ---------------------------------------------------------------------------
// RelationshipResolver
// ---------------------------------------------------------------------------

/// Single-hop and edge-attribute lookups for one request.
///
/// Holds borrowed handles only; it is `Sync` whenever the backend is, so
/// projections can share it across rayon workers.
pub struct RelationshipResolver<'a, B: ?Sized> {
    backend: &'a B,
    policy: &'a dyn PrimarySourcePolicy,
}

impl<B: ?Sized> Clone for RelationshipResolver<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: ?Sized> Copy for RelationshipResolver<'_, B> {}

impl<'a, B: GraphBackend + ?Sized> RelationshipResolver<'a, B> {
    pub fn new(backend: &'a B, policy: &'a dyn PrimarySourcePolicy) -> Self {
        Self { backend, policy }
    }

    /// Qualifying edges for `relation`, most recently recorded first.
    fn qualifying_edges(&self, entity: &Entity, relation: Relation) -> Result<Vec<EdgeRecord>> {
        let mut edges = match relation.direction() {
            Direction::Outgoing => self.backend.out_edges(&entity.uid, relation.rel_type())?,
            Direction::Incoming => self.backend.in_edges(&entity.uid, relation.rel_type())?,
        };
        edges.retain(|e| relation.qualifies(e));
        edges.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(edges)
    }

    /// Zero-or-one related entity: the far end of the most recently
    /// recorded qualifying edge that still resolves.
    pub fn single(&self, entity: &Entity, relation: Relation) -> Result<Option<Entity>> {
        for edge in self.qualifying_edges(entity, relation)? {
            if let Some(found) = self.backend.entity(relation.far_end(&edge))? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// All distinct related entities that still resolve.
    pub fn collection(&self, entity: &Entity, relation: Relation) -> Result<Collection> {
        let uids: BTreeSet<String> = self
            .qualifying_edges(entity, relation)?
            .iter()
            .map(|e| relation.far_end(e).to_string())
            .collect();

        let mut members = Vec::with_capacity(uids.len());
        for uid in &uids {
            if let Some(found) = self.backend.entity(uid)? {
                members.push(found);
            }
        }
        Ok(Collection { members })
    }

    /// Attributes of the specific edge joining `entity` to `other` under
    /// `relation`. With several such edges, the most recently recorded wins.
    pub fn edge_attributes(
        &self,
        entity: &Entity,
        relation: Relation,
        other: &Entity,
    ) -> Result<Option<Properties>> {
        Ok(self
            .qualifying_edges(entity, relation)?
            .into_iter()
            .find(|e| relation.far_end(e) == other.uid)
            .map(|e| e.attributes))
    }

    /// Every resolvable citation of `entity`.
    pub fn citations(&self, entity: &Entity) -> Result<Vec<Citation>> {
        let relation = Relation::Citations;
        let mut citations = Vec::new();
        for edge in self.qualifying_edges(entity, relation)? {
            if let Some(source) = self.backend.entity(relation.far_end(&edge))? {
                citations.push(Citation { source, edge });
            }
        }
        Ok(citations)
    }

    /// The citation chosen by the configured [`PrimarySourcePolicy`].
    pub fn primary_source(&self, entity: &Entity) -> Result<Option<Citation>> {
        let citations = self.citations(entity)?;
        Ok(self.policy.select(entity, &citations).cloned())
    }

    /// Store-derived officer total for an agency.
    pub fn total_officers(&self, agency: &Entity) -> Result<u64> {
        self.backend.total_officers(&agency.uid)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
