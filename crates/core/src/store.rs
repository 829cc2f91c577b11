//! Basket store seam.
//!
//! The host owns and persists the order basket. Core services only ever read the current list
//! for an order type, compute the next list, and hand it back through [`BasketStore`].

use crate::order::{parse_basket_item, OrderBasketItem};
use crate::{OrderError, OrderResult};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Trait for order basket storage, keyed by order type.
///
/// Implement this trait to plug the core into a host's basket (browser session store, database,
/// file, ...).
pub trait BasketStore: Send + Sync {
    /// Current basket items for an order type, in insertion order.
    fn get_orders(&self, order_type_uuid: &str) -> OrderResult<Vec<OrderBasketItem>>;

    /// Replace the basket items for an order type.
    fn set_orders(&self, order_type_uuid: &str, orders: Vec<OrderBasketItem>) -> OrderResult<()>;
}

/// Process-local basket store.
#[derive(Debug, Default)]
pub struct InMemoryBasketStore {
    baskets: Mutex<HashMap<String, Vec<OrderBasketItem>>>,
}

impl InMemoryBasketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BasketStore for InMemoryBasketStore {
    fn get_orders(&self, order_type_uuid: &str) -> OrderResult<Vec<OrderBasketItem>> {
        let baskets = self.baskets.lock().map_err(|_| OrderError::StorePoisoned)?;
        Ok(baskets.get(order_type_uuid).cloned().unwrap_or_default())
    }

    fn set_orders(&self, order_type_uuid: &str, orders: Vec<OrderBasketItem>) -> OrderResult<()> {
        let mut baskets = self.baskets.lock().map_err(|_| OrderError::StorePoisoned)?;
        baskets.insert(order_type_uuid.to_string(), orders);
        Ok(())
    }
}

/// Basket store backed by a single JSON document mapping order type to items.
///
/// A missing file reads as an empty basket. Writes go to a sibling temporary file which is then
/// renamed over the document.
#[derive(Debug, Clone)]
pub struct JsonFileBasketStore {
    path: PathBuf,
}

impl JsonFileBasketStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> OrderResult<BTreeMap<String, Vec<OrderBasketItem>>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(OrderError::StoreRead(e)),
        };

        let raw: BTreeMap<String, Vec<serde_json::Value>> =
            serde_json::from_str(&text).map_err(OrderError::StoreDeserialization)?;

        raw.into_iter()
            .map(|(order_type, items)| {
                let items = items
                    .iter()
                    .map(parse_basket_item)
                    .collect::<OrderResult<Vec<_>>>()?;
                Ok((order_type, items))
            })
            .collect()
    }

    fn write_all(&self, baskets: &BTreeMap<String, Vec<OrderBasketItem>>) -> OrderResult<()> {
        let json =
            serde_json::to_string_pretty(baskets).map_err(OrderError::StoreSerialization)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(OrderError::StoreWrite)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(OrderError::StoreWrite)?;
        fs::rename(&tmp_path, &self.path).map_err(OrderError::StoreWrite)?;
        Ok(())
    }
}

impl BasketStore for JsonFileBasketStore {
    fn get_orders(&self, order_type_uuid: &str) -> OrderResult<Vec<OrderBasketItem>> {
        Ok(self
            .read_all()?
            .remove(order_type_uuid)
            .unwrap_or_default())
    }

    fn set_orders(&self, order_type_uuid: &str, orders: Vec<OrderBasketItem>) -> OrderResult<()> {
        let mut baskets = self.read_all()?;
        if orders.is_empty() {
            baskets.remove(order_type_uuid);
        } else {
            baskets.insert(order_type_uuid.to_string(), orders);
        }
        self.write_all(&baskets)?;
        tracing::debug!("basket store written: {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{create_empty_order, ConceptRef, OrderAction};

    fn item(concept: &str) -> OrderBasketItem {
        create_empty_order(ConceptRef::new(concept, concept), "pr1")
    }

    #[test]
    fn in_memory_store_keeps_order_types_apart() {
        let store = InMemoryBasketStore::new();
        store.set_orders("t1", vec![item("c1")]).expect("set");
        store.set_orders("t2", vec![item("c2"), item("c3")]).expect("set");

        assert_eq!(store.get_orders("t1").expect("get").len(), 1);
        assert_eq!(store.get_orders("t2").expect("get").len(), 2);
        assert!(store.get_orders("t3").expect("get").is_empty());
    }

    #[test]
    fn file_store_reads_missing_file_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileBasketStore::new(dir.path().join("basket.json"));
        assert!(store.get_orders("t1").expect("get").is_empty());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("basket.json");

        let mut revised = item("c2");
        revised.action = OrderAction::Revise;
        revised.previous_order = Some("o1".into());

        JsonFileBasketStore::new(&path)
            .set_orders("t1", vec![item("c1"), revised.clone()])
            .expect("set");

        let reopened = JsonFileBasketStore::new(&path);
        let orders = reopened.get_orders("t1").expect("get");
        assert_eq!(orders, vec![item("c1"), revised]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn file_store_drops_empty_baskets() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("basket.json");
        let store = JsonFileBasketStore::new(&path);

        store.set_orders("t1", vec![item("c1")]).expect("set");
        store.set_orders("t1", Vec::new()).expect("clear");

        let text = fs::read_to_string(&path).expect("read");
        assert_eq!(text.trim(), "{}");
    }

    #[test]
    fn file_store_reports_unknown_action() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("basket.json");
        fs::write(
            &path,
            r#"{"t1": [{"action": "HOLD", "concept": {"uuid": "c1"}}]}"#,
        )
        .expect("write");

        let err = JsonFileBasketStore::new(&path)
            .get_orders("t1")
            .expect_err("unknown action");
        assert!(matches!(err, OrderError::UnknownAction(a) if a == "HOLD"));
    }
}
