//! Plugin configuration.
//!
//! Configuration is loaded once at startup, validated, and then passed by reference into the
//! services that need it. Nothing in this crate reads configuration from ambient state after
//! that point.
//!
//! Recognised keys (YAML or JSON):
//! - `orderTypes`: order types listed in the basket, each with its orderable concept sets
//! - `quantityUnits`: `{conceptUuid, map}` where `map` is `answers` or `setMembers`
//! - `showReferenceNumberField`: whether the order form offers a reference number input
//!
//! Every key is optional and falls back to the defaults in [`crate::constants`]. Unknown keys and
//! unknown `map` values are rejected.

use crate::constants::{
    DEFAULT_ORDERABLE_CONCEPT_SET, DEFAULT_ORDER_TYPE_UUID, DEFAULT_QUANTITY_UNITS_CONCEPT_UUID,
};
use crate::{OrderError, OrderResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use supply_types::ResourceUuid;

/// Which child list of the quantity-units concept holds the selectable units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConceptMap {
    /// Use the concept's coded answers.
    Answers,
    /// Use the concept's set members.
    SetMembers,
}

/// One order type shown in the order basket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OrderTypeConfig {
    pub order_type_uuid: ResourceUuid,

    #[serde(default)]
    pub orderable_concept_sets: Vec<ResourceUuid>,
}

/// Source of the quantity units offered on the order form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QuantityUnitsConfig {
    #[serde(default = "default_quantity_units_concept")]
    pub concept_uuid: ResourceUuid,

    #[serde(default = "default_concept_map")]
    pub map: ConceptMap,
}

impl Default for QuantityUnitsConfig {
    fn default() -> Self {
        Self {
            concept_uuid: default_quantity_units_concept(),
            map: default_concept_map(),
        }
    }
}

/// Plugin configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SupplyConfig {
    #[serde(default = "default_order_types")]
    order_types: Vec<OrderTypeConfig>,

    #[serde(default)]
    quantity_units: QuantityUnitsConfig,

    #[serde(default)]
    show_reference_number_field: bool,
}

impl Default for SupplyConfig {
    fn default() -> Self {
        Self {
            order_types: default_order_types(),
            quantity_units: QuantityUnitsConfig::default(),
            show_reference_number_field: false,
        }
    }
}

impl SupplyConfig {
    /// Create a validated configuration from its parts.
    pub fn new(
        order_types: Vec<OrderTypeConfig>,
        quantity_units: QuantityUnitsConfig,
        show_reference_number_field: bool,
    ) -> OrderResult<Self> {
        let cfg = Self {
            order_types,
            quantity_units,
            show_reference_number_field,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse and validate a YAML configuration document.
    pub fn from_yaml_str(yaml_text: &str) -> OrderResult<Self> {
        let cfg: Self = serde_yaml::from_str(yaml_text).map_err(OrderError::ConfigYaml)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json_text: &str) -> OrderResult<Self> {
        let cfg: Self = serde_json::from_str(json_text).map_err(OrderError::ConfigJson)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a configuration file. Files ending in `.json` are parsed as JSON, anything else as
    /// YAML.
    pub fn load(path: &Path) -> OrderResult<Self> {
        let text = std::fs::read_to_string(path).map_err(OrderError::ConfigRead)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let cfg = if is_json {
            Self::from_json_str(&text)?
        } else {
            Self::from_yaml_str(&text)?
        };

        tracing::debug!(
            "loaded configuration from {} ({} order types)",
            path.display(),
            cfg.order_types.len()
        );
        Ok(cfg)
    }

    /// Check the cross-field rules that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::InvalidConfig`] if no order type is configured or an order type is
    /// listed more than once.
    pub fn validate(&self) -> OrderResult<()> {
        if self.order_types.is_empty() {
            return Err(OrderError::InvalidConfig(
                "orderTypes must list at least one order type".into(),
            ));
        }

        let mut seen = HashSet::new();
        for order_type in &self.order_types {
            if !seen.insert(order_type.order_type_uuid.as_str()) {
                return Err(OrderError::InvalidConfig(format!(
                    "order type {} is listed more than once",
                    order_type.order_type_uuid
                )));
            }
        }

        Ok(())
    }

    pub fn order_types(&self) -> &[OrderTypeConfig] {
        &self.order_types
    }

    pub fn quantity_units(&self) -> &QuantityUnitsConfig {
        &self.quantity_units
    }

    pub fn show_reference_number_field(&self) -> bool {
        self.show_reference_number_field
    }

    /// Find the configured order type with the given identifier.
    pub fn order_type(&self, order_type_uuid: &str) -> Option<&OrderTypeConfig> {
        self.order_types
            .iter()
            .find(|t| t.order_type_uuid.as_str() == order_type_uuid)
    }
}

fn default_order_types() -> Vec<OrderTypeConfig> {
    vec![OrderTypeConfig {
        order_type_uuid: builtin_uuid(DEFAULT_ORDER_TYPE_UUID),
        orderable_concept_sets: vec![builtin_uuid(DEFAULT_ORDERABLE_CONCEPT_SET)],
    }]
}

fn default_quantity_units_concept() -> ResourceUuid {
    builtin_uuid(DEFAULT_QUANTITY_UNITS_CONCEPT_UUID)
}

fn default_concept_map() -> ConceptMap {
    ConceptMap::SetMembers
}

fn builtin_uuid(value: &'static str) -> ResourceUuid {
    ResourceUuid::from_static(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = SupplyConfig::default();
        cfg.validate().expect("defaults validate");
        assert_eq!(cfg.order_types().len(), 1);
        assert_eq!(
            cfg.order_types()[0].order_type_uuid.as_str(),
            DEFAULT_ORDER_TYPE_UUID
        );
        assert_eq!(
            cfg.quantity_units().concept_uuid.as_str(),
            DEFAULT_QUANTITY_UNITS_CONCEPT_UUID
        );
        assert_eq!(cfg.quantity_units().map, ConceptMap::SetMembers);
        assert!(!cfg.show_reference_number_field());
    }

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = SupplyConfig::from_yaml_str("{}").expect("parse");
        assert_eq!(cfg, SupplyConfig::default());
    }

    #[test]
    fn parses_full_yaml() {
        let input = r#"
orderTypes:
  - orderTypeUuid: t1
    orderableConceptSets: [s1, s2]
  - orderTypeUuid: t2
quantityUnits:
  conceptUuid: units
  map: answers
showReferenceNumberField: true
"#;
        let cfg = SupplyConfig::from_yaml_str(input).expect("parse");
        assert_eq!(cfg.order_types().len(), 2);
        assert_eq!(cfg.order_type("t1").map(|t| t.orderable_concept_sets.len()), Some(2));
        assert!(cfg.order_type("t2").is_some_and(|t| t.orderable_concept_sets.is_empty()));
        assert!(cfg.order_type("t3").is_none());
        assert_eq!(cfg.quantity_units().map, ConceptMap::Answers);
        assert!(cfg.show_reference_number_field());
    }

    #[test]
    fn partial_quantity_units_keeps_field_defaults() {
        let cfg = SupplyConfig::from_json_str(r#"{"quantityUnits": {"map": "answers"}}"#)
            .expect("parse");
        assert_eq!(
            cfg.quantity_units().concept_uuid.as_str(),
            DEFAULT_QUANTITY_UNITS_CONCEPT_UUID
        );
        assert_eq!(cfg.quantity_units().map, ConceptMap::Answers);
    }

    #[test]
    fn rejects_unknown_map_value() {
        let err = SupplyConfig::from_yaml_str("quantityUnits:\n  map: conceptClass\n")
            .expect_err("unknown map must be rejected");
        match err {
            OrderError::ConfigYaml(e) => assert!(e.to_string().contains("unknown variant")),
            other => panic!("expected ConfigYaml error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_concept_uuid() {
        let err = SupplyConfig::from_json_str(r#"{"quantityUnits": {"conceptUuid": ""}}"#)
            .expect_err("empty concept uuid must be rejected");
        assert!(matches!(err, OrderError::ConfigJson(_)));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = SupplyConfig::from_yaml_str("orderTypez: []\n").expect_err("typo must fail");
        assert!(matches!(err, OrderError::ConfigYaml(_)));
    }

    #[test]
    fn rejects_empty_and_duplicate_order_types() {
        let err = SupplyConfig::from_yaml_str("orderTypes: []\n").expect_err("empty list");
        assert!(matches!(err, OrderError::InvalidConfig(_)));

        let err = SupplyConfig::from_yaml_str(
            "orderTypes:\n  - orderTypeUuid: t1\n  - orderTypeUuid: t1\n",
        )
        .expect_err("duplicate order type");
        match err {
            OrderError::InvalidConfig(msg) => assert!(msg.contains("t1")),
            other => panic!("expected InvalidConfig error, got {other:?}"),
        }
    }

    #[test]
    fn load_dispatches_on_extension() {
        let dir = tempfile::tempdir().expect("tempdir");

        let json_path = dir.path().join("config.json");
        std::fs::write(&json_path, r#"{"showReferenceNumberField": true}"#).expect("write");
        assert!(SupplyConfig::load(&json_path)
            .expect("load json")
            .show_reference_number_field());

        let yaml_path = dir.path().join("config.yaml");
        std::fs::write(&yaml_path, "showReferenceNumberField: false\n").expect("write");
        assert!(!SupplyConfig::load(&yaml_path)
            .expect("load yaml")
            .show_reference_number_field());

        let missing = SupplyConfig::load(&dir.path().join("missing.yaml"));
        assert!(matches!(missing, Err(OrderError::ConfigRead(_))));
    }
}
