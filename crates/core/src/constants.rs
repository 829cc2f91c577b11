//! Constants used throughout the supply-core crate.
//!
//! Default configuration identifiers and fixed wire values live here so that the config
//! defaults, the payload builder and the tests agree on them.

/// Care setting used for NEW and RENEW submissions (the outpatient care setting).
pub const CARE_SETTING_UUID: &str = "6f0c9a92-6f24-11e3-af88-005056821db0";

/// Value of the `type` discriminator in every order post body.
pub const ORDER_POST_TYPE: &str = "medicalsupplyorder";

/// Default order type listed in the order basket.
pub const DEFAULT_ORDER_TYPE_UUID: &str = "67a92bd6-0f88-11ea-8d71-362b9e155667";

/// Default concept set holding orderable medical supplies.
pub const DEFAULT_ORDERABLE_CONCEPT_SET: &str = "4b573f1d-beb1-401a-92c3-b40409694f98";

/// Default concept whose children are offered as quantity units.
pub const DEFAULT_QUANTITY_UNITS_CONCEPT_UUID: &str = "162402AAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Maximum length of free-text instructions on an order.
pub const MAX_INSTRUCTIONS_LEN: usize = 500;

/// Maximum length of a reference (accession) number.
pub const MAX_ACCESSION_NUMBER_LEN: usize = 150;
