//! Order basket reconciliation.
//!
//! The basket for an order type is an ordered list of pending changes. This module computes the
//! next list for each user action (save a form, remove an entry, modify or cancel a placed order)
//! and groups the list for display. Persistence is delegated to a [`BasketStore`].
//!
//! Invariant: at most one entry per `(action, concept.uuid)`. Every insertion goes through
//! [`reconcile`], which replaces a matching entry in place or appends.

use crate::order::{revive_from_order, OrderAction, OrderBasketItem, OrderFormData};
use crate::payload::{build_payload, OrderPayload};
use crate::quantity_units::QuantityUnits;
use crate::store::BasketStore;
use crate::validation::validate_order_form;
use crate::{OrderError, OrderResult};
use chrono::NaiveDate;
use openmrs::PlacedOrder;

// ============================================================================
// Pure list operations
// ============================================================================

/// Insert `edited` into the basket: replace the entry for the same order in place, or append.
///
/// The stored entry is always marked complete, so applying the same edit twice gives the same
/// basket as applying it once.
pub fn reconcile(basket: &[OrderBasketItem], edited: OrderBasketItem) -> Vec<OrderBasketItem> {
    let edited = OrderBasketItem {
        is_order_incomplete: false,
        ..edited
    };

    let mut next = basket.to_vec();
    match next.iter().position(|item| item.same_order(&edited)) {
        Some(index) => next[index] = edited,
        None => next.push(edited),
    }
    next
}

/// Remove the entry at `index` (the entry the user clicked).
pub fn remove_at(basket: &[OrderBasketItem], index: usize) -> OrderResult<Vec<OrderBasketItem>> {
    if index >= basket.len() {
        return Err(OrderError::NoSuchItem(index));
    }
    let mut next = basket.to_vec();
    next.remove(index);
    Ok(next)
}

/// The entry for the same order as `candidate`, if the basket already has one.
pub fn find_existing<'a>(
    basket: &'a [OrderBasketItem],
    candidate: &OrderBasketItem,
) -> Option<&'a OrderBasketItem> {
    basket.iter().find(|item| item.same_order(candidate))
}

/// Whether the basket already acts on the placed order `order_uuid`.
pub fn contains_order(basket: &[OrderBasketItem], order_uuid: &str) -> bool {
    basket
        .iter()
        .any(|item| item.uuid.as_deref() == Some(order_uuid))
}

/// A basket entry together with its position in the basket.
pub type IndexedItem<'a> = (usize, &'a OrderBasketItem);

/// The basket split into display groups.
///
/// Incomplete entries come first regardless of action; the rest are grouped by action. Within a
/// group, basket order is kept.
#[derive(Debug, Default, PartialEq)]
pub struct BasketGroups<'a> {
    pub incomplete: Vec<IndexedItem<'a>>,
    pub new: Vec<IndexedItem<'a>>,
    pub renewed: Vec<IndexedItem<'a>>,
    pub revised: Vec<IndexedItem<'a>>,
    pub discontinued: Vec<IndexedItem<'a>>,
}

impl<'a> BasketGroups<'a> {
    pub fn len(&self) -> usize {
        self.incomplete.len()
            + self.new.len()
            + self.renewed.len()
            + self.revised.len()
            + self.discontinued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries in display order.
    pub fn iter(&self) -> impl Iterator<Item = IndexedItem<'a>> + '_ {
        self.incomplete
            .iter()
            .chain(&self.new)
            .chain(&self.renewed)
            .chain(&self.revised)
            .chain(&self.discontinued)
            .copied()
    }
}

/// Partition the basket into display groups in a single pass.
pub fn group(basket: &[OrderBasketItem]) -> BasketGroups<'_> {
    let mut groups = BasketGroups::default();
    for entry in basket.iter().enumerate() {
        let (_, item) = entry;
        if item.is_order_incomplete {
            groups.incomplete.push(entry);
            continue;
        }
        match item.action {
            OrderAction::New => groups.new.push(entry),
            OrderAction::Renew => groups.renewed.push(entry),
            OrderAction::Revise => groups.revised.push(entry),
            OrderAction::Discontinue => groups.discontinued.push(entry),
        }
    }
    groups
}

// ============================================================================
// Store-backed basket service
// ============================================================================

/// The basket of one order type, read from and written back to a host store.
pub struct OrderBasket<S: BasketStore> {
    store: S,
    order_type_uuid: String,
}

impl<S: BasketStore> OrderBasket<S> {
    pub fn new(store: S, order_type_uuid: impl Into<String>) -> Self {
        Self {
            store,
            order_type_uuid: order_type_uuid.into(),
        }
    }

    pub fn order_type_uuid(&self) -> &str {
        &self.order_type_uuid
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current basket entries.
    pub fn orders(&self) -> OrderResult<Vec<OrderBasketItem>> {
        self.store.get_orders(&self.order_type_uuid)
    }

    /// Save an order form opened on `initial`.
    ///
    /// Refused while quantity units are loading or failed to load, and when the form does not
    /// validate; in both cases the basket is left untouched. On success the form values are
    /// merged over `initial`, stamped with the current provider (and this basket's order type
    /// when it has none) and reconciled.
    pub fn submit(
        &self,
        initial: &OrderBasketItem,
        form: OrderFormData,
        provider_uuid: &str,
        quantity_units: &QuantityUnits,
        today: NaiveDate,
    ) -> OrderResult<Vec<OrderBasketItem>> {
        if quantity_units.is_loading {
            return Err(OrderError::QuantityUnitsLoading);
        }
        if let Some(error) = &quantity_units.error {
            return Err(OrderError::QuantityUnitsUnavailable(error.clone()));
        }

        let mut edited = form.merge_into(initial);
        validate_order_form(&edited, today).map_err(OrderError::Validation)?;

        edited.orderer = provider_uuid.to_string();
        if edited.order_type.is_none() {
            edited.order_type = Some(self.order_type_uuid.clone());
        }

        tracing::info!(
            "saving {} order for concept {} in basket {}",
            edited.action,
            edited.concept.uuid,
            self.order_type_uuid
        );
        self.replace_with(|orders| Ok(reconcile(orders, edited)))
    }

    /// Remove the entry at `index`.
    pub fn remove(&self, index: usize) -> OrderResult<Vec<OrderBasketItem>> {
        self.replace_with(|orders| remove_at(orders, index))
    }

    /// Start revising a placed order: add a REVISE entry and return it for editing.
    pub fn modify(&self, order: &PlacedOrder) -> OrderResult<OrderBasketItem> {
        let item = revive_from_order(order, OrderAction::Revise);
        self.add_revived(order, item.clone())?;
        Ok(item)
    }

    /// Cancel a placed order: add a DISCONTINUE entry.
    pub fn cancel(&self, order: &PlacedOrder) -> OrderResult<OrderBasketItem> {
        if order.action.as_deref() == Some(OrderAction::Discontinue.as_str()) {
            return Err(OrderError::AlreadyDiscontinued(order.uuid.clone()));
        }
        let item = revive_from_order(order, OrderAction::Discontinue);
        self.add_revived(order, item.clone())?;
        Ok(item)
    }

    /// Build the submission payload of every entry, in basket order.
    pub fn payloads(
        &self,
        patient_uuid: &str,
        encounter_uuid: Option<&str>,
    ) -> OrderResult<Vec<OrderPayload>> {
        self.orders()?
            .iter()
            .map(|item| build_payload(item, patient_uuid, encounter_uuid))
            .collect()
    }

    fn add_revived(&self, order: &PlacedOrder, item: OrderBasketItem) -> OrderResult<()> {
        self.replace_with(|orders| {
            if contains_order(orders, &order.uuid) {
                return Err(OrderError::AlreadyInBasket(order.uuid.clone()));
            }
            tracing::info!(
                "adding {} of order {} to basket {}",
                item.action,
                order.uuid,
                self.order_type_uuid
            );
            Ok(reconcile(orders, item))
        })?;
        Ok(())
    }

    fn replace_with<F>(&self, next: F) -> OrderResult<Vec<OrderBasketItem>>
    where
        F: FnOnce(&[OrderBasketItem]) -> OrderResult<Vec<OrderBasketItem>>,
    {
        let current = self.orders()?;
        let updated = next(&current)?;
        self.store
            .set_orders(&self.order_type_uuid, updated.clone())?;
        Ok(updated)
    }
}
