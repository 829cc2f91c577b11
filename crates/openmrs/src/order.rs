//! Order wire models and translation helpers.
//!
//! Two shapes cross the REST boundary:
//! - a *placed* order, as returned by `GET /order/{uuid}?v=full`, which is revived into an
//!   editable basket item when a clinician modifies or cancels it
//! - an order *post*, the JSON body the host sends when the basket is submitted
//!
//! Responsibilities:
//! - Parse placed orders into a flat [`PlacedOrder`] carrier
//! - Define the [`OrderPost`] body with the field names the server expects
//!
//! Notes:
//! - Absent optional fields are omitted from the post body rather than sent as `null`.

use crate::OpenmrsError;
use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// A reference to another REST resource (`{uuid, display}`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub uuid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl ResourceRef {
    pub fn new(uuid: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            display: Some(display.into()),
        }
    }
}

/// Domain-level carrier for a previously placed order (flat structure).
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedOrder {
    /// Identifier of the placed order.
    pub uuid: String,

    /// Server-rendered summary of the order.
    pub display: Option<String>,

    /// Human-facing order number (e.g. `ORD-42`).
    pub order_number: Option<String>,

    /// Action the order was placed with (`NEW`, `REVISE`, `DISCONTINUE`, ...).
    pub action: Option<String>,

    /// Provider who placed the order.
    pub orderer_uuid: String,

    /// Care setting the order was placed in.
    pub care_setting_uuid: String,

    /// Order type of the placed order.
    pub order_type_uuid: String,

    /// Ordered concept.
    pub concept: ResourceRef,

    pub urgency: Option<String>,
    pub instructions: Option<String>,
    pub accession_number: Option<String>,
    pub quantity: Option<f64>,
    pub quantity_units: Option<ResourceRef>,
}

/// JSON body of an order submission.
///
/// `action` and `type` are always present; every other field is omitted when `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPost {
    pub action: String,

    #[serde(rename = "type")]
    pub order_kind: String,

    pub patient: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub care_setting: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub orderer: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<String>,

    pub concept: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_order: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub accession_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity_units: Option<String>,
}

impl OrderPost {
    /// Render the body as a JSON value, ready to be sent by the host.
    pub fn to_json(&self) -> Result<serde_json::Value, OpenmrsError> {
        Ok(serde_json::to_value(self)?)
    }
}

// ============================================================================
// Public OrderResource operations
// ============================================================================

/// Placed-order resource operations.
///
/// This is a zero-sized type used for namespacing order-related operations.
pub struct OrderResource;

impl OrderResource {
    /// Parse a placed order from the JSON body of `GET /order/{uuid}?v=full`.
    ///
    /// # Errors
    ///
    /// Returns [`OpenmrsError::Translation`] naming the offending path when a required
    /// reference (`orderer`, `careSetting`, `orderType`, `concept`) is missing or malformed.
    pub fn parse(json_text: &str) -> Result<PlacedOrder, OpenmrsError> {
        let wire: PlacedOrderWire = crate::parse_json(json_text, "Order")?;

        if wire.uuid.trim().is_empty() {
            return Err(OpenmrsError::InvalidInput("order uuid cannot be empty".into()));
        }

        Ok(wire_to_domain(wire))
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlacedOrderWire {
    uuid: String,
    #[serde(default)]
    display: Option<String>,
    #[serde(default)]
    order_number: Option<String>,
    #[serde(default)]
    action: Option<String>,
    orderer: ResourceRef,
    care_setting: ResourceRef,
    order_type: ResourceRef,
    concept: ResourceRef,
    #[serde(default)]
    urgency: Option<String>,
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default)]
    accession_number: Option<String>,
    #[serde(default)]
    quantity: Option<f64>,
    #[serde(default)]
    quantity_units: Option<ResourceRef>,
}

fn wire_to_domain(wire: PlacedOrderWire) -> PlacedOrder {
    PlacedOrder {
        uuid: wire.uuid,
        display: wire.display,
        order_number: wire.order_number,
        action: wire.action,
        orderer_uuid: wire.orderer.uuid,
        care_setting_uuid: wire.care_setting.uuid,
        order_type_uuid: wire.order_type.uuid,
        concept: wire.concept,
        urgency: wire.urgency,
        instructions: wire.instructions,
        accession_number: wire.accession_number,
        quantity: wire.quantity,
        quantity_units: wire.quantity_units,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_ORDER: &str = r#"{
        "uuid": "o1",
        "display": "Gauze roll",
        "orderNumber": "ORD-42",
        "action": "NEW",
        "type": "medicalsupplyorder",
        "orderer": {"uuid": "pr1", "display": "Dr. Example"},
        "careSetting": {"uuid": "cs1", "display": "Outpatient"},
        "orderType": {"uuid": "t1", "display": "Medical supply order"},
        "concept": {"uuid": "c1", "display": "Gauze roll"},
        "urgency": "ROUTINE",
        "instructions": "Change daily",
        "accessionNumber": null,
        "quantity": 5.0,
        "quantityUnits": {"uuid": "u1", "display": "Roll"}
    }"#;

    #[test]
    fn parses_full_representation() {
        let order = OrderResource::parse(FULL_ORDER).expect("parse order");
        assert_eq!(order.uuid, "o1");
        assert_eq!(order.order_number.as_deref(), Some("ORD-42"));
        assert_eq!(order.orderer_uuid, "pr1");
        assert_eq!(order.care_setting_uuid, "cs1");
        assert_eq!(order.order_type_uuid, "t1");
        assert_eq!(order.concept.uuid, "c1");
        assert_eq!(order.quantity, Some(5.0));
        assert_eq!(order.quantity_units, Some(ResourceRef::new("u1", "Roll")));
        assert!(order.accession_number.is_none());
    }

    #[test]
    fn missing_orderer_is_reported_by_path() {
        let input = r#"{
            "uuid": "o1",
            "careSetting": {"uuid": "cs1"},
            "orderType": {"uuid": "t1"},
            "concept": {"uuid": "c1"}
        }"#;

        let err = OrderResource::parse(input).expect_err("orderer is required");
        match err {
            OpenmrsError::Translation(msg) => assert!(msg.contains("orderer"), "{msg}"),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_blank_uuid() {
        let input = r#"{
            "uuid": " ",
            "orderer": {"uuid": "pr1"},
            "careSetting": {"uuid": "cs1"},
            "orderType": {"uuid": "t1"},
            "concept": {"uuid": "c1"}
        }"#;

        assert!(matches!(
            OrderResource::parse(input),
            Err(OpenmrsError::InvalidInput(_))
        ));
    }

    #[test]
    fn post_body_omits_absent_fields() {
        let post = OrderPost {
            action: "DISCONTINUE".into(),
            order_kind: "medicalsupplyorder".into(),
            patient: "p1".into(),
            care_setting: Some("cs1".into()),
            orderer: Some("pr1".into()),
            encounter: Some("e1".into()),
            concept: "c1".into(),
            instructions: None,
            previous_order: Some("o1".into()),
            accession_number: None,
            urgency: Some("ROUTINE".into()),
            order_type: Some("t1".into()),
            quantity: None,
            quantity_units: None,
        };

        let json = post.to_json().expect("render");
        assert_eq!(json["type"], "medicalsupplyorder");
        assert_eq!(json["previousOrder"], "o1");
        assert_eq!(json["careSetting"], "cs1");
        assert!(json.get("quantity").is_none());
        assert!(json.get("quantityUnits").is_none());
        assert!(json.get("instructions").is_none());
    }
}
