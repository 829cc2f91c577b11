//! Order basket item model.
//!
//! A basket item is one pending change to a medical supply order: a new order, a renewal, a
//! revision or a discontinuation. Items are created empty when a clinician picks a concept,
//! edited through the order form, and revived from placed orders when modifying or cancelling.
//!
//! The serialised form (camelCase JSON) is what the host's basket store persists.

use crate::{OrderError, OrderResult};
use chrono::NaiveDate;
use openmrs::PlacedOrder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of change a basket item represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderAction {
    New,
    Renew,
    Revise,
    Discontinue,
}

impl OrderAction {
    pub const ALL: [OrderAction; 4] = [
        OrderAction::New,
        OrderAction::Renew,
        OrderAction::Revise,
        OrderAction::Discontinue,
    ];

    /// Wire representation (`NEW`, `RENEW`, `REVISE`, `DISCONTINUE`).
    pub fn as_str(self) -> &'static str {
        match self {
            OrderAction::New => "NEW",
            OrderAction::Renew => "RENEW",
            OrderAction::Revise => "REVISE",
            OrderAction::Discontinue => "DISCONTINUE",
        }
    }

    /// REVISE and DISCONTINUE act on a placed order and must name it in `previousOrder`.
    pub fn needs_previous_order(self) -> bool {
        matches!(self, OrderAction::Revise | OrderAction::Discontinue)
    }
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderAction {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| OrderError::UnknownAction(s.to_string()))
    }
}

/// Priority of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderUrgency {
    #[default]
    Routine,
    Stat,
    OnScheduledDate,
}

impl OrderUrgency {
    /// Options in the order they are offered on the form; the first is the default.
    pub const OPTIONS: [OrderUrgency; 3] = [
        OrderUrgency::Routine,
        OrderUrgency::Stat,
        OrderUrgency::OnScheduledDate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderUrgency::Routine => "ROUTINE",
            OrderUrgency::Stat => "STAT",
            OrderUrgency::OnScheduledDate => "ON_SCHEDULED_DATE",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderUrgency::Routine => "Routine",
            OrderUrgency::Stat => "Stat",
            OrderUrgency::OnScheduledDate => "On scheduled date",
        }
    }
}

impl fmt::Display for OrderUrgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderUrgency {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderUrgency::OPTIONS
            .into_iter()
            .find(|urgency| urgency.as_str() == s)
            .ok_or_else(|| OrderError::UnknownUrgency(s.to_string()))
    }
}

/// A `{uuid, display}` reference to a concept.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptRef {
    pub uuid: String,

    #[serde(default)]
    pub display: String,
}

impl ConceptRef {
    pub fn new(uuid: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            display: display.into(),
        }
    }
}

impl From<&openmrs::Concept> for ConceptRef {
    fn from(concept: &openmrs::Concept) -> Self {
        Self::new(concept.uuid.clone(), concept.display.clone())
    }
}

impl From<openmrs::ResourceRef> for ConceptRef {
    fn from(r: openmrs::ResourceRef) -> Self {
        Self {
            uuid: r.uuid,
            display: r.display.unwrap_or_default(),
        }
    }
}

/// One pending change in the order basket.
///
/// Basket identity is `(action, concept.uuid)`, see [`OrderBasketItem::same_order`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBasketItem {
    pub action: OrderAction,

    /// Placed order this item acts on, when revived from one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    #[serde(default)]
    pub display: String,

    pub concept: ConceptRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<OrderUrgency>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_units: Option<ConceptRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accession_number: Option<String>,

    #[serde(default)]
    pub orderer: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub care_setting: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_order: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,

    /// Set by the host when an item was added without passing through the form.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_order_incomplete: bool,
}

impl OrderBasketItem {
    /// Whether two items describe the same basket entry: same action on the same concept.
    ///
    /// `previousOrder` and `uuid` are not compared.
    pub fn same_order(&self, other: &OrderBasketItem) -> bool {
        self.action == other.action && self.concept.uuid == other.concept.uuid
    }

    /// Change the urgency. Leaving `ON_SCHEDULED_DATE` clears any scheduled date.
    pub fn set_urgency(&mut self, urgency: OrderUrgency) {
        if urgency != OrderUrgency::OnScheduledDate {
            self.scheduled_date = None;
        }
        self.urgency = Some(urgency);
    }
}

/// Values the clinician edits on the order form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderFormData {
    pub urgency: Option<OrderUrgency>,
    pub scheduled_date: Option<NaiveDate>,
    pub quantity: Option<u32>,
    pub quantity_units: Option<ConceptRef>,
    pub instructions: Option<String>,
    pub accession_number: Option<String>,
}

impl OrderFormData {
    /// Form values pre-filled from an item being edited.
    pub fn from_item(item: &OrderBasketItem) -> Self {
        Self {
            urgency: item.urgency,
            scheduled_date: item.scheduled_date,
            quantity: item.quantity,
            quantity_units: item.quantity_units.clone(),
            instructions: item.instructions.clone(),
            accession_number: item.accession_number.clone(),
        }
    }

    /// The item that opened the form with every form value written over it.
    ///
    /// Blank text inputs are stored as absent. A scheduled date only survives with
    /// `ON_SCHEDULED_DATE` urgency.
    pub fn merge_into(self, initial: &OrderBasketItem) -> OrderBasketItem {
        let scheduled_date = self
            .scheduled_date
            .filter(|_| self.urgency == Some(OrderUrgency::OnScheduledDate));

        OrderBasketItem {
            urgency: self.urgency,
            scheduled_date,
            quantity: self.quantity,
            quantity_units: self.quantity_units,
            instructions: self.instructions.filter(|s| !s.trim().is_empty()),
            accession_number: self.accession_number.filter(|s| !s.trim().is_empty()),
            ..initial.clone()
        }
    }
}

/// Create the NEW item that opens the order form after a concept is picked from search.
pub fn create_empty_order(concept: ConceptRef, orderer: impl Into<String>) -> OrderBasketItem {
    OrderBasketItem {
        action: OrderAction::New,
        uuid: None,
        display: concept.display.clone(),
        concept,
        urgency: Some(OrderUrgency::default()),
        scheduled_date: None,
        quantity: None,
        quantity_units: None,
        instructions: None,
        accession_number: None,
        orderer: orderer.into(),
        care_setting: None,
        previous_order: None,
        order_type: None,
        order_number: None,
        is_order_incomplete: false,
    }
}

/// Turn a placed order into an editable basket item for the given action.
///
/// `previousOrder` points at the placed order for every action except NEW.
pub fn revive_from_order(order: &PlacedOrder, action: OrderAction) -> OrderBasketItem {
    let urgency = order.urgency.as_deref().and_then(|u| match u.parse() {
        Ok(urgency) => Some(urgency),
        Err(_) => {
            tracing::warn!("order {} has unrecognised urgency {}", order.uuid, u);
            None
        }
    });

    let quantity = order.quantity.and_then(|q| {
        if !(q.is_finite() && q >= 0.0 && q <= f64::from(u32::MAX)) {
            tracing::warn!("order {} has unusable quantity {}; dropped", order.uuid, q);
            return None;
        }
        let whole = q.round();
        if whole != q {
            tracing::warn!("order {} quantity {} rounded to {}", order.uuid, q, whole);
        }
        Some(whole as u32)
    });

    OrderBasketItem {
        action,
        uuid: Some(order.uuid.clone()),
        display: order.display.clone().unwrap_or_default(),
        concept: order.concept.clone().into(),
        urgency,
        scheduled_date: None,
        quantity,
        quantity_units: order.quantity_units.clone().map(ConceptRef::from),
        instructions: order.instructions.clone(),
        accession_number: order.accession_number.clone(),
        orderer: order.orderer_uuid.clone(),
        care_setting: Some(order.care_setting_uuid.clone()),
        previous_order: (action != OrderAction::New).then(|| order.uuid.clone()),
        order_type: Some(order.order_type_uuid.clone()),
        order_number: order.order_number.clone(),
        is_order_incomplete: false,
    }
}

/// Detail lines shown under a placed order: quantity with units, then instructions if any.
pub fn order_detail_summary(order: &PlacedOrder) -> Vec<String> {
    let quantity = order.quantity.unwrap_or(0.0);
    let units = order
        .quantity_units
        .as_ref()
        .and_then(|u| u.display.as_deref())
        .unwrap_or("");

    let mut lines = vec![format!("Quantity {quantity} {units}").trim_end().to_string()];
    if let Some(instructions) = order.instructions.as_deref().filter(|i| !i.is_empty()) {
        lines.push(format!("Instructions {instructions}"));
    }
    lines
}

/// Parse a basket item from JSON.
///
/// Unknown actions are reported as [`OrderError::UnknownAction`]; a REVISE or DISCONTINUE item
/// without `previousOrder` as [`OrderError::MissingPreviousOrder`].
pub fn parse_basket_item(json: &serde_json::Value) -> OrderResult<OrderBasketItem> {
    if let Some(action) = json.get("action").and_then(|a| a.as_str()) {
        action.parse::<OrderAction>()?;
    }
    let item: OrderBasketItem =
        serde_json::from_value(json.clone()).map_err(OrderError::StoreDeserialization)?;

    let has_previous = item
        .previous_order
        .as_deref()
        .is_some_and(|uuid| !uuid.trim().is_empty());
    if item.action.needs_previous_order() && !has_previous {
        return Err(OrderError::MissingPreviousOrder(item.action));
    }
    Ok(item)
}
