//! Concept wire models and translation helpers.
//!
//! A concept is a coded term from the backend's concept dictionary. The plugin only needs a
//! concept's identity and its two child lists (`setMembers` and `answers`), which are used as
//! the source of selectable quantity units.
//!
//! Notes:
//! - The REST representation carries many more fields (names, datatype, links, ...). They are
//!   ignored rather than rejected.
//! - Concepts are treated as read-only reference data once fetched.

use crate::OpenmrsError;
use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// Domain-level carrier for a concept and its children.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Concept {
    /// Concept identifier.
    pub uuid: String,

    /// Human-readable name. Empty when the server omitted it.
    pub display: String,

    /// Members when the concept is a set.
    pub set_members: Vec<Concept>,

    /// Coded answers when the concept is a question.
    pub answers: Vec<Concept>,
}

impl Concept {
    /// Create a leaf concept with no children.
    pub fn leaf(uuid: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            display: display.into(),
            set_members: Vec::new(),
            answers: Vec::new(),
        }
    }
}

// ============================================================================
// Public ConceptResource operations
// ============================================================================

/// Concept resource operations.
///
/// This is a zero-sized type used for namespacing concept-related operations.
pub struct ConceptResource;

impl ConceptResource {
    /// Parse a concept from the JSON body of `GET /concept/{uuid}`.
    ///
    /// # Errors
    ///
    /// Returns [`OpenmrsError::Translation`] naming the offending path if the body is not a
    /// concept representation (for example `uuid` missing, or `setMembers` not an array).
    pub fn parse(json_text: &str) -> Result<Concept, OpenmrsError> {
        let wire: ConceptWire = crate::parse_json(json_text, "Concept")?;
        Ok(wire_to_domain(wire))
    }

    /// Render a concept in its REST shape (`uuid`, `display`, `setMembers`, `answers`).
    pub fn render(concept: &Concept) -> Result<String, OpenmrsError> {
        Ok(serde_json::to_string(&domain_to_wire(concept))?)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct ConceptWire {
    uuid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    display: Option<String>,

    #[serde(rename = "setMembers", default, deserialize_with = "null_as_empty")]
    set_members: Vec<ConceptWire>,

    #[serde(default, deserialize_with = "null_as_empty")]
    answers: Vec<ConceptWire>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ConceptWire>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<ConceptWire>>::deserialize(deserializer)?.unwrap_or_default())
}

fn wire_to_domain(wire: ConceptWire) -> Concept {
    Concept {
        uuid: wire.uuid,
        display: wire.display.unwrap_or_default(),
        set_members: wire.set_members.into_iter().map(wire_to_domain).collect(),
        answers: wire.answers.into_iter().map(wire_to_domain).collect(),
    }
}

fn domain_to_wire(concept: &Concept) -> ConceptWire {
    ConceptWire {
        uuid: concept.uuid.clone(),
        display: (!concept.display.is_empty()).then(|| concept.display.clone()),
        set_members: concept.set_members.iter().map(domain_to_wire).collect(),
        answers: concept.answers.iter().map(domain_to_wire).collect(),
    }
}
