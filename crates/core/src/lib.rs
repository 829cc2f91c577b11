//! # Supply Core
//!
//! Core business logic for the medical supply order basket.
//!
//! This crate contains pure basket operations plus the services that wrap them:
//! - basket item model and revival of placed orders ([`order`])
//! - basket reconciliation, removal and grouping ([`basket`])
//! - submission payload construction per action ([`payload`])
//! - order form validation ([`validation`])
//! - fetch-once quantity-unit lookup ([`quantity_units`])
//! - configuration loading and validation ([`config`])
//! - the host basket store seam ([`store`])
//!
//! **No transport concerns**: REST wire models and the HTTP client belong in `openmrs`.

pub mod basket;
pub mod config;
pub mod constants;
pub mod error;
pub mod order;
pub mod payload;
pub mod quantity_units;
pub mod store;
pub mod validation;

pub use basket::{group, reconcile, remove_at, BasketGroups, OrderBasket};
pub use config::{ConceptMap, OrderTypeConfig, QuantityUnitsConfig, SupplyConfig};
pub use error::{OrderError, OrderResult};
pub use order::{ConceptRef, OrderAction, OrderBasketItem, OrderFormData, OrderUrgency};
pub use payload::{build_payload, OrderPayload};
pub use quantity_units::{ConceptSource, QuantityUnitLookup, QuantityUnits};
pub use store::{BasketStore, InMemoryBasketStore, JsonFileBasketStore};
pub use validation::{validate_order_form, FormErrors, FormField};
