//! Core domain types for roster-search.
//!
//! Raw graph records ([`Entity`], [`EdgeRecord`]) as the store hands them
//! out, the kind classification used to pick a projection, the describable
//! classifications carried on entities, and the [`SearchResult`] record the
//! search pipeline returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::parse_flexible_datetime;

/// Property/attribute bag stored on entities and edges.
pub type Properties = Map<String, Value>;

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// The entity kinds the search pipeline knows how to summarise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Officer,
    Agency,
    Unit,
}

impl EntityKind {
    /// The graph label that marks an entity of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Officer => "Officer",
            Self::Agency => "Agency",
            Self::Unit => "Unit",
        }
    }

    /// Exact (case-sensitive) label match, like the graph store does it.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Officer" => Some(Self::Officer),
            "Agency" => Some(Self::Agency),
            "Unit" => Some(Self::Unit),
            _ => None,
        }
    }

    /// Classify a label set.
    ///
    /// Labels outside {Officer, Agency, Unit} are ignored. Returns `None`
    /// when no recognized label is present or when more than one distinct
    /// recognized label is present.
    pub fn classify<S: AsRef<str>>(labels: &[S]) -> Option<Self> {
        let mut found: Option<Self> = None;
        for kind in labels.iter().filter_map(|l| Self::from_label(l.as_ref())) {
            match found {
                None => found = Some(kind),
                Some(existing) if existing == kind => {}
                Some(_) => return None,
            }
        }
        found
    }

    /// Path segment used when building result hrefs.
    pub fn collection_path(&self) -> &'static str {
        match self {
            Self::Officer => "officers",
            Self::Agency => "agencies",
            Self::Unit => "units",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Describable classifications
// ---------------------------------------------------------------------------

/// Lowercase, and fold `_`/`-` separators to spaces, so enum codes such as
/// `HISPANIC_LATINO` and descriptions such as `Hispanic or Latino` compare
/// on equal footing.
fn normalize_choice(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Officer ethnicity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ethnicity {
    AmericanIndianAlaskaNative,
    Asian,
    BlackAfricanAmerican,
    HispanicLatino,
    NativeHawaiianPacificIslander,
    White,
}

impl Ethnicity {
    /// Human-readable description used in result subtitles.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::AmericanIndianAlaskaNative => "American Indian or Alaska Native",
            Self::Asian => "Asian",
            Self::BlackAfricanAmerican => "Black or African American",
            Self::HispanicLatino => "Hispanic or Latino",
            Self::NativeHawaiianPacificIslander => "Native Hawaiian or Other Pacific Islander",
            Self::White => "White",
        }
    }

    /// Parse an enum code or a description (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match normalize_choice(s).as_str() {
            "american indian alaska native" | "american indian or alaska native" => {
                Some(Self::AmericanIndianAlaskaNative)
            }
            "asian" => Some(Self::Asian),
            "black african american" | "black or african american" | "black" => {
                Some(Self::BlackAfricanAmerican)
            }
            "hispanic latino" | "hispanic or latino" | "hispanic" | "latino" => {
                Some(Self::HispanicLatino)
            }
            "native hawaiian pacific islander" | "native hawaiian or other pacific islander" => {
                Some(Self::NativeHawaiianPacificIslander)
            }
            "white" => Some(Self::White),
            _ => None,
        }
    }
}

/// Officer gender classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match normalize_choice(s).as_str() {
            "male" | "m" => Some(Self::Male),
            "female" | "f" => Some(Self::Female),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Agency jurisdiction classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Jurisdiction {
    Federal,
    State,
    County,
    Municipal,
    Private,
    Other,
}

impl Jurisdiction {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Federal => "Federal",
            Self::State => "State",
            Self::County => "County",
            Self::Municipal => "Municipal",
            Self::Private => "Private",
            Self::Other => "Other",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match normalize_choice(s).as_str() {
            "federal" => Some(Self::Federal),
            "state" => Some(Self::State),
            "county" => Some(Self::County),
            "municipal" | "city" => Some(Self::Municipal),
            "private" => Some(Self::Private),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A graph node as stored: labels plus a JSON property bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub uid: String,
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: Properties,
}

impl Entity {
    pub fn new(uid: impl Into<String>, labels: &[&str]) -> Self {
        Self {
            uid: uid.into(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            properties: Properties::new(),
        }
    }

    /// Builder-style property setter, mostly for loaders and tests.
    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn kind(&self) -> Option<EntityKind> {
        EntityKind::classify(&self.labels)
    }

    /// A string property, treating missing, null, and blank values alike.
    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// ---------------------------------------------------------------------------
// EdgeRecord
// ---------------------------------------------------------------------------

/// A relationship instance. Attributes live on the edge itself, so two
/// edges of the same type between the same entities stay distinguishable
/// by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Store-assigned id; higher means recorded later.
    pub id: i64,
    pub source: String,
    pub target: String,
    pub rel_type: String,
    #[serde(default)]
    pub attributes: Properties,
}

impl EdgeRecord {
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn attr_datetime(&self, key: &str) -> Option<DateTime<Utc>> {
        self.attr_str(key).and_then(parse_flexible_datetime)
    }
}

// ---------------------------------------------------------------------------
// ScoredEntity
// ---------------------------------------------------------------------------

/// One full-text match: the raw entity and the index's relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntity {
    pub entity: Entity,
    /// Higher is more relevant. Passed through from the index untouched.
    pub score: f64,
}

// ---------------------------------------------------------------------------
// SearchResult
// ---------------------------------------------------------------------------

/// Uniform, human-readable summary of one matched entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub uid: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub details: Option<Vec<String>>,
    pub content_type: EntityKind,
    pub source: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub href: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
