//! Per-kind projection of raw entities into [`SearchResult`] summaries.
//!
//! An entity is classified once into a [`ClassifiedEntity`]; each variant
//! owns its projection. Unclassifiable entities project to `None` and are
//! dropped by the caller.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::graph::backend::GraphBackend;
use crate::graph::relations::{Relation, RelationshipResolver};
use crate::types::{Entity, EntityKind, Ethnicity, Gender, Jurisdiction, SearchResult};

const UNKNOWN_SOURCE: &str = "Unknown Source";
const UNKNOWN_AGENCY: &str = "Unknown Agency";
const UNKNOWN_ETHNICITY: &str = "Unknown Ethnicity";
const UNKNOWN_GENDER: &str = "Unknown Gender";
const UNKNOWN_CITY: &str = "Unknown City";
const UNKNOWN_STATE: &str = "Unknown State";
const DEFAULT_RANK: &str = "Officer";

/// Href prefix used when none is configured.
pub const DEFAULT_HREF_PREFIX: &str = "/api/v1";

// ---------------------------------------------------------------------------
// ProjectionContext
// ---------------------------------------------------------------------------

/// Per-request values shared by every projection of one search.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionContext {
    /// When the request was made; fallback `last_updated` for agencies and
    /// units without a dated primary source.
    pub requested_at: DateTime<Utc>,
    /// Prefix for result hrefs, e.g. `/api/v1`.
    pub href_prefix: String,
}

impl ProjectionContext {
    pub fn new(requested_at: DateTime<Utc>, href_prefix: impl Into<String>) -> Self {
        Self {
            requested_at,
            href_prefix: href_prefix.into(),
        }
    }

    fn href(&self, kind: EntityKind, uid: &str) -> String {
        format!(
            "{}/{}/{}",
            self.href_prefix.trim_end_matches('/'),
            kind.collection_path(),
            uid
        )
    }
}

impl Default for ProjectionContext {
    fn default() -> Self {
        Self::new(Utc::now(), DEFAULT_HREF_PREFIX)
    }
}

// ---------------------------------------------------------------------------
// Typed views
// ---------------------------------------------------------------------------

/// Officer view over a raw entity.
#[derive(Debug, Clone, Copy)]
pub struct OfficerNode<'e>(pub &'e Entity);

impl OfficerNode<'_> {
    /// Non-empty name parts joined by single spaces.
    pub fn full_name(&self) -> String {
        ["first_name", "middle_name", "last_name", "suffix"]
            .iter()
            .filter_map(|k| self.0.prop_str(k))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn ethnicity(&self) -> Option<Ethnicity> {
        self.0.prop_str("ethnicity").and_then(Ethnicity::from_str_loose)
    }

    pub fn gender(&self) -> Option<Gender> {
        self.0.prop_str("gender").and_then(Gender::from_str_loose)
    }
}

/// Agency view over a raw entity.
#[derive(Debug, Clone, Copy)]
pub struct AgencyNode<'e>(pub &'e Entity);

impl<'e> AgencyNode<'e> {
    pub fn name(&self) -> Option<&'e str> {
        self.0.prop_str("name")
    }

    pub fn jurisdiction(&self) -> Option<Jurisdiction> {
        self.0
            .prop_str("jurisdiction")
            .and_then(Jurisdiction::from_str_loose)
    }

    pub fn hq_city(&self) -> Option<&'e str> {
        self.0.prop_str("hq_city")
    }

    pub fn hq_state(&self) -> Option<&'e str> {
        self.0.prop_str("hq_state")
    }
}

/// Unit view over a raw entity.
#[derive(Debug, Clone, Copy)]
pub struct UnitNode<'e>(pub &'e Entity);

impl<'e> UnitNode<'e> {
    pub fn name(&self) -> Option<&'e str> {
        self.0.prop_str("name")
    }
}

// ---------------------------------------------------------------------------
// ClassifiedEntity
// ---------------------------------------------------------------------------

/// A raw entity tagged with the one kind it was classified as.
#[derive(Debug, Clone, Copy)]
pub enum ClassifiedEntity<'e> {
    Officer(OfficerNode<'e>),
    Agency(AgencyNode<'e>),
    Unit(UnitNode<'e>),
}

impl<'e> ClassifiedEntity<'e> {
    /// Classify by label set; `None` for unrecognized or ambiguous labels.
    pub fn classify(entity: &'e Entity) -> Option<Self> {
        entity.kind().map(|kind| match kind {
            EntityKind::Officer => Self::Officer(OfficerNode(entity)),
            EntityKind::Agency => Self::Agency(AgencyNode(entity)),
            EntityKind::Unit => Self::Unit(UnitNode(entity)),
        })
    }

    pub fn project<B: GraphBackend + ?Sized>(
        &self,
        resolver: &RelationshipResolver<'_, B>,
        ctx: &ProjectionContext,
    ) -> Result<SearchResult> {
        match self {
            Self::Officer(o) => project_officer(*o, resolver, ctx),
            Self::Agency(a) => project_agency(*a, resolver, ctx),
            Self::Unit(u) => project_unit(*u, resolver, ctx),
        }
    }
}

/// Project one raw entity. Returns `Ok(None)` when the entity's kind is not
/// recognized; backend failures propagate.
pub fn project<B: GraphBackend + ?Sized>(
    entity: &Entity,
    resolver: &RelationshipResolver<'_, B>,
    ctx: &ProjectionContext,
) -> Result<Option<SearchResult>> {
    match ClassifiedEntity::classify(entity) {
        Some(classified) => classified.project(resolver, ctx).map(Some),
        None => {
            tracing::trace!(uid = %entity.uid, labels = ?entity.labels, "dropping unrecognized entity");
            Ok(None)
        }
    }
}

// ---------------------------------------------------------------------------
// Per-kind projections
// ---------------------------------------------------------------------------

/// Primary source name and its citation date, if any.
fn provenance<B: GraphBackend + ?Sized>(
    entity: &Entity,
    resolver: &RelationshipResolver<'_, B>,
) -> Result<(String, Option<DateTime<Utc>>)> {
    Ok(match resolver.primary_source(entity)? {
        Some(citation) => (
            citation.source_name().unwrap_or(UNKNOWN_SOURCE).to_string(),
            citation.date(),
        ),
        None => (UNKNOWN_SOURCE.to_string(), None),
    })
}

/// Name of the agency that established `unit`.
fn parent_agency_name<B: GraphBackend + ?Sized>(
    unit: &Entity,
    resolver: &RelationshipResolver<'_, B>,
) -> Result<String> {
    let agency = resolver.single(unit, Relation::UnitAgency)?;
    Ok(agency
        .as_ref()
        .and_then(|a| AgencyNode(a).name())
        .unwrap_or(UNKNOWN_AGENCY)
        .to_string())
}

fn project_officer<B: GraphBackend + ?Sized>(
    officer: OfficerNode<'_>,
    resolver: &RelationshipResolver<'_, B>,
    ctx: &ProjectionContext,
) -> Result<SearchResult> {
    let entity = officer.0;

    let (rank, agency) = match resolver.single(entity, Relation::CurrentUnit)? {
        Some(unit) => {
            let rank = resolver
                .edge_attributes(entity, Relation::CurrentUnit, &unit)?
                .and_then(|attrs| {
                    attrs
                        .get("rank")
                        .and_then(|v| v.as_str())
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| DEFAULT_RANK.to_string());
            (rank, parent_agency_name(&unit, resolver)?)
        }
        None => (DEFAULT_RANK.to_string(), UNKNOWN_AGENCY.to_string()),
    };

    let subtitle = format!(
        "{} {}, {} at the {}",
        officer.ethnicity().map_or(UNKNOWN_ETHNICITY, |e| e.describe()),
        officer.gender().map_or(UNKNOWN_GENDER, |g| g.describe()),
        rank,
        agency,
    );

    let (source, last_updated) = provenance(entity, resolver)?;

    Ok(SearchResult {
        uid: entity.uid.clone(),
        title: officer.full_name(),
        subtitle: Some(subtitle),
        details: None,
        content_type: EntityKind::Officer,
        source,
        // Officers without a dated primary source report no timestamp.
        last_updated,
        href: ctx.href(EntityKind::Officer, &entity.uid),
    })
}

fn project_agency<B: GraphBackend + ?Sized>(
    agency: AgencyNode<'_>,
    resolver: &RelationshipResolver<'_, B>,
    ctx: &ProjectionContext,
) -> Result<SearchResult> {
    let entity = agency.0;

    let subtitle = format!(
        "{} Agency in {}, {}",
        agency.jurisdiction().map_or("", |j| j.describe()),
        agency.hq_city().unwrap_or(UNKNOWN_CITY),
        agency.hq_state().unwrap_or(UNKNOWN_STATE),
    );

    let unit_count = resolver.collection(entity, Relation::AgencyUnits)?.count();
    let officer_count = resolver.total_officers(entity)?;

    let (source, last_updated) = provenance(entity, resolver)?;

    Ok(SearchResult {
        uid: entity.uid.clone(),
        title: agency.name().unwrap_or_default().to_string(),
        subtitle: Some(subtitle),
        details: Some(vec![format!(
            "{unit_count} Unit(s) and {officer_count} Officers"
        )]),
        content_type: EntityKind::Agency,
        source,
        last_updated: Some(last_updated.unwrap_or(ctx.requested_at)),
        href: ctx.href(EntityKind::Agency, &entity.uid),
    })
}

fn project_unit<B: GraphBackend + ?Sized>(
    unit: UnitNode<'_>,
    resolver: &RelationshipResolver<'_, B>,
    ctx: &ProjectionContext,
) -> Result<SearchResult> {
    let entity = unit.0;

    let agency = parent_agency_name(entity, resolver)?;
    let officer_count = resolver.collection(entity, Relation::UnitOfficers)?.count();
    let commander = resolver
        .single(entity, Relation::UnitCommander)?
        .map(|c| OfficerNode(&c).full_name())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let (source, last_updated) = provenance(entity, resolver)?;

    Ok(SearchResult {
        uid: entity.uid.clone(),
        title: unit.name().unwrap_or_default().to_string(),
        subtitle: Some(format!("Established by the {agency}")),
        details: Some(vec![
            format!("{officer_count} Officer(s)"),
            format!("Commander: {commander}"),
        ]),
        content_type: EntityKind::Unit,
        source,
        last_updated: Some(last_updated.unwrap_or(ctx.requested_at)),
        href: ctx.href(EntityKind::Unit, &entity.uid),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::memory::MemoryGraph;
    use crate::graph::relations::{
        LatestCitation, COMMANDED_BY, ESTABLISHED_BY, MEMBER_OF_UNIT, UPDATED_BY,
    };
    use crate::types::Properties;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ctx() -> ProjectionContext {
        ProjectionContext::new(
            Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            DEFAULT_HREF_PREFIX,
        )
    }

    fn attrs(pairs: &[(&str, &str)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect()
    }

    fn run(g: &MemoryGraph, entity: &Entity) -> Option<SearchResult> {
        let resolver = RelationshipResolver::new(g, &LatestCitation);
        project(entity, &resolver, &ctx()).unwrap()
    }

    fn metro_graph() -> MemoryGraph {
        let mut g = MemoryGraph::new();
        g.add_entity(
            Entity::new("o1", &["Officer"])
                .with_property("first_name", "John")
                .with_property("last_name", "Smith")
                .with_property("gender", "MALE"),
        );
        g.add_entity(Entity::new("u1", &["Unit"]).with_property("name", "Patrol"));
        g.add_entity(
            Entity::new("a1", &["Agency"])
                .with_property("name", "Metro PD")
                .with_property("jurisdiction", "MUNICIPAL")
                .with_property("hq_city", "Springfield")
                .with_property("hq_state", "IL"),
        );
        g.add_entity(Entity::new("s1", &["Source"]).with_property("name", "City Records"));
        g.add_edge("o1", "u1", MEMBER_OF_UNIT, attrs(&[("rank", "Sergeant")]));
        g.add_edge("u1", "a1", ESTABLISHED_BY, Properties::new());
        g
    }

    #[test]
    fn officer_subtitle_with_unit_and_agency() {
        let g = metro_graph();
        let o = g_entity(&g, "o1");
        let r = run(&g, &o).unwrap();
        assert_eq!(r.title, "John Smith");
        assert_eq!(
            r.subtitle.as_deref(),
            Some("Unknown Ethnicity Male, Sergeant at the Metro PD")
        );
        assert_eq!(r.content_type, EntityKind::Officer);
        assert_eq!(r.details, None);
        assert_eq!(r.href, "/api/v1/officers/o1");
    }

    #[test]
    fn officer_without_unit_uses_defaults() {
        let mut g = MemoryGraph::new();
        let o = Entity::new("o9", &["Officer"])
            .with_property("first_name", "Pat")
            .with_property("ethnicity", "ASIAN")
            .with_property("gender", "FEMALE");
        g.add_entity(o.clone());
        let r = run(&g, &o).unwrap();
        assert_eq!(
            r.subtitle.as_deref(),
            Some("Asian Female, Officer at the Unknown Agency")
        );
    }

    #[test]
    fn officer_unit_without_agency() {
        let mut g = MemoryGraph::new();
        let o = Entity::new("o1", &["Officer"]);
        g.add_entity(o.clone());
        g.add_entity(Entity::new("u1", &["Unit"]));
        g.add_edge("o1", "u1", MEMBER_OF_UNIT, attrs(&[("rank", "Lieutenant")]));
        let r = run(&g, &o).unwrap();
        assert_eq!(
            r.subtitle.as_deref(),
            Some("Unknown Ethnicity Unknown Gender, Lieutenant at the Unknown Agency")
        );
    }

    #[test]
    fn officer_without_source_has_no_timestamp() {
        let g = metro_graph();
        let r = run(&g, &g_entity(&g, "o1")).unwrap();
        assert_eq!(r.source, "Unknown Source");
        assert_eq!(r.last_updated, None);
    }

    #[test]
    fn officer_with_source_uses_citation_date() {
        let mut g = metro_graph();
        g.add_edge("o1", "s1", UPDATED_BY, attrs(&[("date", "2024-03-05T00:00:00Z")]));
        let r = run(&g, &g_entity(&g, "o1")).unwrap();
        assert_eq!(r.source, "City Records");
        assert_eq!(
            r.last_updated,
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn agency_projection() {
        let mut g = metro_graph();
        g.add_entity(Entity::new("u2", &["Unit"]).with_property("name", "Traffic"));
        g.add_entity(Entity::new("o2", &["Officer"]));
        g.add_edge("u2", "a1", ESTABLISHED_BY, Properties::new());
        g.add_edge("o2", "u2", MEMBER_OF_UNIT, Properties::new());
        g.add_edge("o1", "u2", MEMBER_OF_UNIT, Properties::new());

        let r = run(&g, &g_entity(&g, "a1")).unwrap();
        assert_eq!(r.title, "Metro PD");
        assert_eq!(
            r.subtitle.as_deref(),
            Some("Municipal Agency in Springfield, IL")
        );
        assert_eq!(
            r.details,
            Some(vec!["2 Unit(s) and 2 Officers".to_string()])
        );
        assert_eq!(r.href, "/api/v1/agencies/a1");
    }

    #[test]
    fn agency_fallbacks_and_now_timestamp() {
        let mut g = MemoryGraph::new();
        let a = Entity::new("a2", &["Agency"]).with_property("name", "Nowhere PD");
        g.add_entity(a.clone());
        let r = run(&g, &a).unwrap();
        assert_eq!(
            r.subtitle.as_deref(),
            Some(" Agency in Unknown City, Unknown State")
        );
        assert_eq!(r.details, Some(vec!["0 Unit(s) and 0 Officers".to_string()]));
        assert_eq!(r.source, "Unknown Source");
        assert_eq!(r.last_updated, Some(ctx().requested_at));
    }

    #[test]
    fn agency_with_source_uses_citation_date() {
        let mut g = metro_graph();
        g.add_edge("a1", "s1", UPDATED_BY, attrs(&[("date", "2022-07-04")]));
        let r = run(&g, &g_entity(&g, "a1")).unwrap();
        assert_eq!(r.source, "City Records");
        assert_eq!(
            r.last_updated,
            Some(Utc.with_ymd_and_hms(2022, 7, 4, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn unit_projection_with_commander() {
        let mut g = metro_graph();
        g.add_entity(
            Entity::new("o2", &["Officer"])
                .with_property("first_name", "Maria")
                .with_property("last_name", "Lopez"),
        );
        g.add_edge("o2", "u1", MEMBER_OF_UNIT, Properties::new());
        g.add_edge("u1", "o2", COMMANDED_BY, Properties::new());

        let r = run(&g, &g_entity(&g, "u1")).unwrap();
        assert_eq!(r.title, "Patrol");
        assert_eq!(r.subtitle.as_deref(), Some("Established by the Metro PD"));
        assert_eq!(
            r.details,
            Some(vec![
                "2 Officer(s)".to_string(),
                "Commander: Maria Lopez".to_string()
            ])
        );
        assert_eq!(r.last_updated, Some(ctx().requested_at));
        assert_eq!(r.href, "/api/v1/units/u1");
    }

    #[test]
    fn unit_details_always_have_two_entries() {
        let mut g = MemoryGraph::new();
        let u = Entity::new("u5", &["Unit"]);
        g.add_entity(u.clone());
        let r = run(&g, &u).unwrap();
        assert_eq!(r.subtitle.as_deref(), Some("Established by the Unknown Agency"));
        assert_eq!(
            r.details,
            Some(vec!["0 Officer(s)".to_string(), "Commander: Unknown".to_string()])
        );
    }

    #[test]
    fn former_commander_is_not_current() {
        let mut g = metro_graph();
        g.add_edge("u1", "o1", COMMANDED_BY, attrs(&[("latest_date", "2020-01-01")]));
        let r = run(&g, &g_entity(&g, "u1")).unwrap();
        assert_eq!(r.details.unwrap()[1], "Commander: Unknown");
    }

    #[test]
    fn unrecognized_entity_projects_to_none() {
        let g = MemoryGraph::new();
        assert!(run(&g, &Entity::new("c1", &["Civilian"])).is_none());
        assert!(run(&g, &Entity::new("x1", &["Officer", "Unit"])).is_none());
    }

    #[test]
    fn backend_failure_during_projection_propagates() {
        let mut g = metro_graph();
        let o = g_entity(&g, "o1");
        g.fail_reads("connection reset");
        let resolver = RelationshipResolver::new(&g, &LatestCitation);
        assert!(project(&o, &resolver, &ctx()).is_err());
    }

    #[test]
    fn view_fields_borrow_from_the_entity() {
        let agency = Entity::new("a1", &["Agency"])
            .with_property("name", "Metro PD")
            .with_property("hq_city", "Springfield")
            .with_property("hq_state", "IL");
        let unit = Entity::new("u1", &["Unit"]).with_property("name", "Patrol");
        let (name, city, state) = {
            let view = AgencyNode(&agency);
            (view.name(), view.hq_city(), view.hq_state())
        };
        let unit_name = UnitNode(&unit).name();
        assert_eq!(name, Some("Metro PD"));
        assert_eq!(city, Some("Springfield"));
        assert_eq!(state, Some("IL"));
        assert_eq!(unit_name, Some("Patrol"));
    }

    #[test]
    fn href_prefix_trailing_slash_is_normalized() {
        let c = ProjectionContext::new(Utc::now(), "/api/v2/");
        assert_eq!(c.href(EntityKind::Unit, "u1"), "/api/v2/units/u1");
    }

    fn g_entity(g: &MemoryGraph, uid: &str) -> Entity {
        g.entity(uid).unwrap().expect("fixture entity")
    }
}
