//! Quantity-unit lookup.
//!
//! The units offered on the order form are the children of one configured concept, either its
//! set members or its answers. The concept is fetched at most once per concept identifier and
//! kept for the life of the lookup; concurrent callers share a single in-flight request.
//!
//! A failed fetch is reported (and logged) but not cached, so the next `load` fetches again.

use crate::config::{ConceptMap, QuantityUnitsConfig};
use crate::OrderResult;
use async_trait::async_trait;
use openmrs::{Concept, RestClient};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use supply_types::ResourceUuid;
use tokio::sync::OnceCell;

/// Source of concepts, normally the REST API.
#[async_trait]
pub trait ConceptSource: Send + Sync {
    async fn fetch_concept(&self, uuid: &ResourceUuid) -> OrderResult<Concept>;
}

#[async_trait]
impl ConceptSource for RestClient {
    async fn fetch_concept(&self, uuid: &ResourceUuid) -> OrderResult<Concept> {
        Ok(self.get_concept(uuid).await?)
    }
}

/// State of the quantity units as seen by the order form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuantityUnits {
    pub concepts: Vec<Concept>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl QuantityUnits {
    /// Saving the form is allowed only once units have loaded without error.
    pub fn can_submit(&self) -> bool {
        !self.is_loading && self.error.is_none()
    }

    /// The unit with the given identifier, if offered.
    pub fn find(&self, uuid: &str) -> Option<&Concept> {
        self.concepts.iter().find(|c| c.uuid == uuid)
    }

    fn loaded(concept: &Concept, map: ConceptMap) -> Self {
        let concepts = match map {
            ConceptMap::SetMembers => concept.set_members.clone(),
            ConceptMap::Answers => concept.answers.clone(),
        };
        Self {
            concepts,
            is_loading: false,
            error: None,
        }
    }

    fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    fn failed(message: String) -> Self {
        Self {
            error: Some(message),
            ..Self::default()
        }
    }
}

type ConceptCell = Arc<OnceCell<Arc<Concept>>>;

/// Fetch-once cache of quantity-unit concepts.
pub struct QuantityUnitLookup<S: ConceptSource> {
    source: S,
    cells: Mutex<HashMap<ResourceUuid, ConceptCell>>,
    errors: Mutex<HashMap<ResourceUuid, String>>,
}

impl<S: ConceptSource> QuantityUnitLookup<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cells: Mutex::new(HashMap::new()),
            errors: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the quantity units for `config`, fetching the concept if it is not cached yet.
    pub async fn load(&self, config: &QuantityUnitsConfig) -> QuantityUnits {
        let uuid = &config.concept_uuid;
        let cell = self.cell(uuid);

        if cell.initialized() {
            tracing::debug!("quantity units cache hit: {}", uuid);
        } else {
            tracing::debug!("quantity units cache miss: {}", uuid);
            lock(&self.errors).remove(uuid);
        }

        let result = cell
            .get_or_try_init(|| async {
                self.source.fetch_concept(uuid).await.map(Arc::new)
            })
            .await;

        match result {
            Ok(concept) => QuantityUnits::loaded(concept, config.map),
            Err(e) => {
                let message = e.to_string();
                tracing::error!("failed to fetch quantity units {}: {}", uuid, message);
                lock(&self.errors).insert(uuid.clone(), message.clone());
                QuantityUnits::failed(message)
            }
        }
    }

    /// Current state without fetching: loaded, failed, or still loading.
    pub fn snapshot(&self, config: &QuantityUnitsConfig) -> QuantityUnits {
        let uuid = &config.concept_uuid;

        if let Some(concept) = lock(&self.cells).get(uuid).and_then(|cell| cell.get()) {
            return QuantityUnits::loaded(concept, config.map);
        }

        match lock(&self.errors).get(uuid) {
            Some(message) => QuantityUnits::failed(message.clone()),
            None => QuantityUnits::loading(),
        }
    }

    fn cell(&self, uuid: &ResourceUuid) -> ConceptCell {
        lock(&self.cells)
            .entry(uuid.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OrderError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct CountingSource {
        calls: AtomicUsize,
        fail_first: bool,
    }

    #[async_trait]
    impl ConceptSource for CountingSource {
        async fn fetch_concept(&self, uuid: &ResourceUuid) -> OrderResult<Concept> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && call == 0 {
                return Err(OrderError::Openmrs(openmrs::OpenmrsError::Status {
                    status: 503,
                    url: format!("/concept/{uuid}"),
                }));
            }
            let mut concept = Concept::leaf(uuid.as_str(), "Units");
            concept.set_members = vec![Concept::leaf("u1", "Box"), Concept::leaf("u2", "Roll")];
            concept.answers = vec![Concept::leaf("u3", "Pack")];
            Ok(concept)
        }
    }

    fn source(fail_first: bool) -> CountingSource {
        CountingSource {
            calls: AtomicUsize::new(0),
            fail_first,
        }
    }

    fn config(map: ConceptMap) -> QuantityUnitsConfig {
        QuantityUnitsConfig {
            concept_uuid: ResourceUuid::new("units").expect("valid"),
            map,
        }
    }

    #[tokio::test]
    async fn fetches_once_and_applies_map() {
        let lookup = QuantityUnitLookup::new(source(false));

        let members = lookup.load(&config(ConceptMap::SetMembers)).await;
        assert!(members.can_submit());
        assert_eq!(members.concepts.len(), 2);
        assert_eq!(members.find("u2").map(|c| c.display.as_str()), Some("Roll"));

        let answers = lookup.load(&config(ConceptMap::Answers)).await;
        assert_eq!(answers.concepts, vec![Concept::leaf("u3", "Pack")]);

        assert_eq!(lookup.source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_loads_share_one_fetch() {
        let lookup = QuantityUnitLookup::new(source(false));
        let cfg = config(ConceptMap::SetMembers);

        let (a, b) = tokio::join!(lookup.load(&cfg), lookup.load(&cfg));
        assert_eq!(a, b);
        assert_eq!(lookup.source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_is_reported_then_retried_on_next_load() {
        let lookup = QuantityUnitLookup::new(source(true));
        let cfg = config(ConceptMap::SetMembers);

        assert!(lookup.snapshot(&cfg).is_loading);

        let failed = lookup.load(&cfg).await;
        assert!(!failed.can_submit());
        assert!(failed.error.as_deref().is_some_and(|e| e.contains("503")));
        assert_eq!(lookup.snapshot(&cfg), failed);

        let loaded = lookup.load(&cfg).await;
        assert!(loaded.can_submit());
        assert_eq!(loaded.concepts.len(), 2);
        assert_eq!(lookup.snapshot(&cfg), loaded);
        assert_eq!(lookup.source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn loads_through_rest_client() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ws/rest/v1/concept/units"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "uuid": "units",
                "display": "Dispensing units",
                "setMembers": [],
                "answers": [{"uuid": "u1", "display": "Box"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RestClient::new(&server.uri(), None).expect("client");
        let lookup = QuantityUnitLookup::new(client);

        let units = lookup.load(&config(ConceptMap::Answers)).await;
        assert_eq!(units.concepts, vec![Concept::leaf("u1", "Box")]);
        let again = lookup.load(&config(ConceptMap::Answers)).await;
        assert_eq!(again, units);
    }
}
