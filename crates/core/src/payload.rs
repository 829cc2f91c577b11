//! Order payload construction.
//!
//! Translates a basket item into the body the host posts when the basket is submitted. The
//! payload shape depends on the action:
//! - NEW and RENEW are both submitted as NEW, in the fixed outpatient care setting
//! - REVISE carries `previousOrder` and keeps the item's own care setting
//! - DISCONTINUE carries only what is needed to stop the previous order (no quantity, units or
//!   instructions)
//!
//! REVISE and DISCONTINUE payloads always name the order they act on; an item without one is
//! refused with [`OrderError::MissingPreviousOrder`].
//!
//! Building a payload is pure: the same item, patient and encounter always give the same payload.

use crate::constants::{CARE_SETTING_UUID, ORDER_POST_TYPE};
use crate::order::{OrderAction, OrderBasketItem, OrderUrgency};
use crate::{OrderError, OrderResult};
use openmrs::OrderPost;

/// Fields shared by NEW and REVISE payloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderLines {
    pub concept: String,
    pub quantity: Option<u32>,
    pub quantity_units: Option<String>,
    pub instructions: Option<String>,
    pub accession_number: Option<String>,
    pub urgency: Option<OrderUrgency>,
    pub order_type: Option<String>,
    pub orderer: String,
}

/// Payload for a NEW (or renewed) order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOrderPayload {
    pub patient: String,
    pub encounter: Option<String>,
    pub care_setting: String,
    pub lines: OrderLines,
}

/// Payload revising a placed order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviseOrderPayload {
    pub patient: String,
    pub encounter: Option<String>,
    pub care_setting: Option<String>,
    pub previous_order: String,
    pub lines: OrderLines,
}

/// Payload discontinuing a placed order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscontinueOrderPayload {
    pub patient: String,
    pub encounter: Option<String>,
    pub care_setting: Option<String>,
    pub concept: String,
    pub previous_order: String,
    pub accession_number: Option<String>,
    pub urgency: Option<OrderUrgency>,
    pub order_type: Option<String>,
    pub orderer: String,
}

/// Submission payload for one basket item, keyed by the action it is posted with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderPayload {
    New(NewOrderPayload),
    Revise(ReviseOrderPayload),
    Discontinue(DiscontinueOrderPayload),
}

impl OrderPayload {
    /// Action the payload is posted with. RENEW items are posted as NEW.
    pub fn action(&self) -> OrderAction {
        match self {
            OrderPayload::New(_) => OrderAction::New,
            OrderPayload::Revise(_) => OrderAction::Revise,
            OrderPayload::Discontinue(_) => OrderAction::Discontinue,
        }
    }

    pub fn previous_order(&self) -> Option<&str> {
        match self {
            OrderPayload::New(_) => None,
            OrderPayload::Revise(p) => Some(&p.previous_order),
            OrderPayload::Discontinue(p) => Some(&p.previous_order),
        }
    }

    /// Translate into the REST post body.
    pub fn to_post(&self) -> OrderPost {
        match self {
            OrderPayload::New(p) => lines_to_post(
                OrderAction::New,
                &p.patient,
                p.encounter.clone(),
                Some(p.care_setting.clone()),
                None,
                &p.lines,
            ),
            OrderPayload::Revise(p) => lines_to_post(
                OrderAction::Revise,
                &p.patient,
                p.encounter.clone(),
                p.care_setting.clone(),
                Some(p.previous_order.clone()),
                &p.lines,
            ),
            OrderPayload::Discontinue(p) => OrderPost {
                action: OrderAction::Discontinue.as_str().to_string(),
                order_kind: ORDER_POST_TYPE.to_string(),
                patient: p.patient.clone(),
                care_setting: p.care_setting.clone(),
                orderer: Some(p.orderer.clone()),
                encounter: p.encounter.clone(),
                concept: p.concept.clone(),
                instructions: None,
                previous_order: Some(p.previous_order.clone()),
                accession_number: p.accession_number.clone(),
                urgency: p.urgency.map(|u| u.as_str().to_string()),
                order_type: p.order_type.clone(),
                quantity: None,
                quantity_units: None,
            },
        }
    }

    /// Render the REST post body as JSON.
    pub fn to_json(&self) -> OrderResult<serde_json::Value> {
        Ok(self.to_post().to_json()?)
    }
}

/// Build the submission payload for a basket item.
///
/// # Errors
///
/// Returns [`OrderError::MissingPreviousOrder`] for a REVISE or DISCONTINUE item that does not
/// name the order it acts on.
pub fn build_payload(
    item: &OrderBasketItem,
    patient_uuid: &str,
    encounter_uuid: Option<&str>,
) -> OrderResult<OrderPayload> {
    let patient = patient_uuid.to_string();
    let encounter = encounter_uuid.map(str::to_string);

    let payload = match item.action {
        OrderAction::New | OrderAction::Renew => OrderPayload::New(NewOrderPayload {
            patient,
            encounter,
            care_setting: CARE_SETTING_UUID.to_string(),
            lines: order_lines(item),
        }),
        OrderAction::Revise => OrderPayload::Revise(ReviseOrderPayload {
            patient,
            encounter,
            care_setting: item.care_setting.clone(),
            previous_order: previous_order(item)?,
            lines: order_lines(item),
        }),
        OrderAction::Discontinue => OrderPayload::Discontinue(DiscontinueOrderPayload {
            patient,
            encounter,
            care_setting: item.care_setting.clone(),
            concept: item.concept.uuid.clone(),
            previous_order: previous_order(item)?,
            accession_number: item.accession_number.clone(),
            urgency: item.urgency,
            order_type: item.order_type.clone(),
            orderer: item.orderer.clone(),
        }),
    };
    Ok(payload)
}

fn previous_order(item: &OrderBasketItem) -> OrderResult<String> {
    item.previous_order
        .as_deref()
        .map(str::trim)
        .filter(|uuid| !uuid.is_empty())
        .map(str::to_string)
        .ok_or(OrderError::MissingPreviousOrder(item.action))
}

fn order_lines(item: &OrderBasketItem) -> OrderLines {
    OrderLines {
        concept: item.concept.uuid.clone(),
        quantity: item.quantity,
        quantity_units: item.quantity_units.as_ref().map(|u| u.uuid.clone()),
        instructions: item.instructions.clone(),
        accession_number: item.accession_number.clone(),
        urgency: item.urgency,
        order_type: item.order_type.clone(),
        orderer: item.orderer.clone(),
    }
}

fn lines_to_post(
    action: OrderAction,
    patient: &str,
    encounter: Option<String>,
    care_setting: Option<String>,
    previous_order: Option<String>,
    lines: &OrderLines,
) -> OrderPost {
    OrderPost {
        action: action.as_str().to_string(),
        order_kind: ORDER_POST_TYPE.to_string(),
        patient: patient.to_string(),
        care_setting,
        orderer: Some(lines.orderer.clone()),
        encounter,
        concept: lines.concept.clone(),
        instructions: lines.instructions.clone(),
        previous_order,
        accession_number: lines.accession_number.clone(),
        urgency: lines.urgency.map(|u| u.as_str().to_string()),
        order_type: lines.order_type.clone(),
        quantity: lines.quantity,
        quantity_units: lines.quantity_units.clone(),
    }
}
