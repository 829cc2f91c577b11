//! Order form validation.
//!
//! Validation reports every failing field at once, plus a one-line summary suitable for a banner.
//! It never touches the basket; a rejected form leaves the basket exactly as it was.

use crate::constants::{MAX_ACCESSION_NUMBER_LEN, MAX_INSTRUCTIONS_LEN};
use crate::order::{OrderBasketItem, OrderUrgency};
use chrono::NaiveDate;
use std::fmt;

/// Summary shown above the form when any field is invalid.
pub const FORM_ERROR_SUMMARY: &str = "Please fill all required fields.";

/// Fields of the order form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormField {
    Concept,
    Urgency,
    ScheduledDate,
    Quantity,
    QuantityUnits,
    Instructions,
    AccessionNumber,
    PreviousOrder,
}

impl FormField {
    /// Field name as used in the basket item's JSON.
    pub fn name(self) -> &'static str {
        match self {
            FormField::Concept => "concept",
            FormField::Urgency => "urgency",
            FormField::ScheduledDate => "scheduledDate",
            FormField::Quantity => "quantity",
            FormField::QuantityUnits => "quantityUnits",
            FormField::Instructions => "instructions",
            FormField::AccessionNumber => "accessionNumber",
            FormField::PreviousOrder => "previousOrder",
        }
    }
}

/// One invalid field and its message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

/// All invalid fields of a submitted form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormErrors {
    pub fields: Vec<FieldError>,
}

impl FormErrors {
    pub fn summary(&self) -> &'static str {
        FORM_ERROR_SUMMARY
    }

    /// Message for a field, if that field is invalid.
    pub fn message_for(&self, field: FormField) -> Option<&str> {
        self.fields
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", FORM_ERROR_SUMMARY)?;
        for error in &self.fields {
            write!(f, " {}: {}.", error.field.name(), error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

/// Validate an edited basket item as submitted from the order form.
///
/// `today` bounds the scheduled date; a date before it is rejected.
pub fn validate_order_form(item: &OrderBasketItem, today: NaiveDate) -> Result<(), FormErrors> {
    let mut fields = Vec::new();
    let mut fail = |field: FormField, message: &str| {
        fields.push(FieldError {
            field,
            message: message.to_string(),
        })
    };

    if item.concept.uuid.trim().is_empty() {
        fail(FormField::Concept, "Orderable concept is required");
    }

    let names_previous = item
        .previous_order
        .as_deref()
        .is_some_and(|uuid| !uuid.trim().is_empty());
    if item.action.needs_previous_order() && !names_previous {
        fail(
            FormField::PreviousOrder,
            &format!("{} order must name the order it changes", item.action),
        );
    }

    match item.urgency {
        None => fail(FormField::Urgency, "Priority is required"),
        Some(OrderUrgency::OnScheduledDate) => match item.scheduled_date {
            None => fail(FormField::ScheduledDate, "Scheduled date is required"),
            Some(date) if date < today => {
                fail(FormField::ScheduledDate, "Scheduled date cannot be in the past")
            }
            Some(_) => {}
        },
        Some(_) => {}
    }

    if item.quantity.is_none() {
        fail(FormField::Quantity, "Quantity is required");
    }

    if item
        .quantity_units
        .as_ref()
        .map_or(true, |u| u.uuid.trim().is_empty())
    {
        fail(FormField::QuantityUnits, "Quantity units is required");
    }

    if item
        .instructions
        .as_ref()
        .is_some_and(|i| i.chars().count() > MAX_INSTRUCTIONS_LEN)
    {
        fail(
            FormField::Instructions,
            &format!("Instructions cannot exceed {MAX_INSTRUCTIONS_LEN} characters"),
        );
    }

    if item
        .accession_number
        .as_ref()
        .is_some_and(|a| a.chars().count() > MAX_ACCESSION_NUMBER_LEN)
    {
        fail(
            FormField::AccessionNumber,
            &format!("Reference number cannot exceed {MAX_ACCESSION_NUMBER_LEN} characters"),
        );
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(FormErrors { fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{create_empty_order, ConceptRef, OrderAction};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
    }

    fn complete_item() -> OrderBasketItem {
        let mut item = create_empty_order(ConceptRef::new("c1", "Gauze roll"), "pr1");
        item.quantity = Some(2);
        item.quantity_units = Some(ConceptRef::new("u1", "Roll"));
        item
    }

    #[test]
    fn complete_form_passes() {
        validate_order_form(&complete_item(), today()).expect("valid");
    }

    #[test]
    fn reports_every_missing_required_field() {
        let mut item = create_empty_order(ConceptRef::new("", ""), "pr1");
        item.urgency = None;

        let errors = validate_order_form(&item, today()).expect_err("invalid");
        assert_eq!(
            errors.message_for(FormField::Concept),
            Some("Orderable concept is required")
        );
        assert_eq!(errors.message_for(FormField::Urgency), Some("Priority is required"));
        assert_eq!(errors.message_for(FormField::Quantity), Some("Quantity is required"));
        assert_eq!(
            errors.message_for(FormField::QuantityUnits),
            Some("Quantity units is required")
        );
        assert_eq!(errors.fields.len(), 4);
        assert_eq!(errors.summary(), FORM_ERROR_SUMMARY);
    }

    #[test]
    fn scheduled_urgency_needs_a_date_not_in_the_past() {
        let mut item = complete_item();
        item.urgency = Some(OrderUrgency::OnScheduledDate);

        let errors = validate_order_form(&item, today()).expect_err("date missing");
        assert_eq!(
            errors.message_for(FormField::ScheduledDate),
            Some("Scheduled date is required")
        );

        item.scheduled_date = today().pred_opt();
        let errors = validate_order_form(&item, today()).expect_err("date in past");
        assert!(errors.message_for(FormField::ScheduledDate).is_some());

        item.scheduled_date = Some(today());
        validate_order_form(&item, today()).expect("today is allowed");
    }

    #[test]
    fn revise_and_discontinue_need_previous_order() {
        for action in [OrderAction::Revise, OrderAction::Discontinue] {
            let mut item = complete_item();
            item.action = action;

            let errors = validate_order_form(&item, today()).expect_err("no previous order");
            assert!(errors.message_for(FormField::PreviousOrder).is_some());
            assert_eq!(errors.fields.len(), 1);

            item.previous_order = Some("o1".into());
            validate_order_form(&item, today()).expect("previous order given");
        }
    }

    #[test]
    fn enforces_text_limits() {
        let mut item = complete_item();
        item.instructions = Some("x".repeat(MAX_INSTRUCTIONS_LEN + 1));
        item.accession_number = Some("y".repeat(MAX_ACCESSION_NUMBER_LEN + 1));

        let errors = validate_order_form(&item, today()).expect_err("too long");
        assert!(errors.message_for(FormField::Instructions).is_some());
        assert!(errors.message_for(FormField::AccessionNumber).is_some());
        assert!(errors.to_string().starts_with(FORM_ERROR_SUMMARY));
    }
}
