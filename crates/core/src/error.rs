use crate::order::OrderAction;
use crate::validation::FormErrors;

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to read configuration file: {0}")]
    ConfigRead(std::io::Error),
    #[error("failed to parse YAML configuration: {0}")]
    ConfigYaml(serde_yaml::Error),
    #[error("failed to parse JSON configuration: {0}")]
    ConfigJson(serde_json::Error),

    #[error("unknown order action: {0}")]
    UnknownAction(String),
    #[error("unknown order urgency: {0}")]
    UnknownUrgency(String),

    #[error("REST error: {0}")]
    Openmrs(#[from] openmrs::OpenmrsError),

    #[error("failed to read basket store: {0}")]
    StoreRead(std::io::Error),
    #[error("failed to write basket store: {0}")]
    StoreWrite(std::io::Error),
    #[error("failed to serialize basket: {0}")]
    StoreSerialization(serde_json::Error),
    #[error("failed to deserialize basket: {0}")]
    StoreDeserialization(serde_json::Error),
    #[error("basket store lock poisoned")]
    StorePoisoned,

    #[error("{0}")]
    Validation(FormErrors),
    #[error("quantity units are still loading")]
    QuantityUnitsLoading,
    #[error("quantity units could not be fetched: {0}")]
    QuantityUnitsUnavailable(String),
    #[error("order {0} is already in the basket")]
    AlreadyInBasket(String),
    #[error("order {0} is already discontinued")]
    AlreadyDiscontinued(String),
    #[error("no basket item at position {0}")]
    NoSuchItem(usize),
    #[error("{0} order does not name the order it acts on")]
    MissingPreviousOrder(OrderAction),
}

pub type OrderResult<T> = std::result::Result<T, OrderError>;
