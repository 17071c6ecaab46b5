//! Converter session
//!
//! Holds the current selection (category, units, input text), the last
//! outcome, and the persisted history and favorites. Storage failures are
//! logged and never undo an in-memory change; the last one is kept for
//! callers that report it.

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use unitkit_core::{IntoMagnitude, DISPLAY_DECIMALS};
use unitkit_units::{convert_with_decimals, CategoryId, ConversionError, ConversionResult, REGISTRY};

use crate::store::{
    load_json, save_json, KeyValueStore, StoreError, CONVERSIONS_KEY, FAVORITES_KEY,
};
use crate::{ConversionHistory, ConversionRecord, Favorite, Favorites};

/// What the user has selected and the outcome of the last conversion
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterState {
    pub category: CategoryId,
    pub from_unit: String,
    pub to_unit: String,
    /// Raw input, parsed only on convert
    pub from_value: String,
    /// `None` until a conversion runs; cleared by every selection change
    pub result: Option<Result<ConversionResult, ConversionError>>,
}

impl Default for ConverterState {
    fn default() -> Self {
        Self {
            category: CategoryId::Length,
            from_unit: "m".to_string(),
            to_unit: "km".to_string(),
            from_value: "1".to_string(),
            result: None,
        }
    }
}

pub struct ConverterSession<S: KeyValueStore> {
    store: S,
    state: ConverterState,
    history: ConversionHistory,
    favorites: Favorites,
    decimals: u32,
    storage_error: Option<StoreError>,
}

fn read_list<T, S>(store: &S, key: &str) -> Vec<T>
where
    T: DeserializeOwned,
    S: KeyValueStore,
{
    match load_json::<Vec<T>, S>(store, key) {
        Ok(Some(items)) => items,
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!(key, error = %e, "discarding unreadable stored data");
            Vec::new()
        }
    }
}

impl<S: KeyValueStore> ConverterSession<S> {
    /// Open a session over `store`, restoring history and favorites
    pub fn load(store: S, capacity: usize) -> Self {
        let records: Vec<ConversionRecord> = read_list(&store, CONVERSIONS_KEY);
        let favorites: Vec<Favorite> = read_list(&store, FAVORITES_KEY);
        debug!(records = records.len(), favorites = favorites.len(), "session loaded");

        Self {
            store,
            state: ConverterState::default(),
            history: ConversionHistory::from_records(capacity, records),
            favorites: Favorites::from_entries(favorites),
            decimals: DISPLAY_DECIMALS,
            storage_error: None,
        }
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn state(&self) -> &ConverterState {
        &self.state
    }

    pub fn history(&self) -> &ConversionHistory {
        &self.history
    }

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// The most recent storage failure not yet taken
    pub fn take_storage_error(&mut self) -> Option<StoreError> {
        self.storage_error.take()
    }

    /// Select a category and its first two units
    pub fn set_category(&mut self, category: &str) -> Result<(), ConversionError> {
        let id: CategoryId = category.parse()?;
        let (from, to) = REGISTRY.default_pair(category)?;
        self.state.category = id;
        self.state.from_unit = from.to_string();
        self.state.to_unit = to.to_string();
        self.state.result = None;
        Ok(())
    }

    pub fn set_from_unit(&mut self, unit: &str) {
        self.state.from_unit = unit.to_string();
        self.state.result = None;
    }

    pub fn set_to_unit(&mut self, unit: &str) {
        self.state.to_unit = unit.to_string();
        self.state.result = None;
    }

    pub fn set_from_value(&mut self, value: &str) {
        self.state.from_value = value.to_string();
        self.state.result = None;
    }

    pub fn swap_units(&mut self) {
        std::mem::swap(&mut self.state.from_unit, &mut self.state.to_unit);
        self.state.result = None;
    }

    /// Convert the current selection and keep the outcome in the state
    pub fn convert(&mut self) -> Result<ConversionResult, ConversionError> {
        let category = self.state.category.as_str();
        let from_unit = self.state.from_unit.clone();
        let to_unit = self.state.to_unit.clone();
        let value = self.state.from_value.clone();
        let outcome = self.convert_value(category, &from_unit, &to_unit, value);
        self.state.result = Some(outcome.clone());
        outcome
    }

    /// Convert arbitrary input without touching the selection. Successful
    /// conversions are recorded in history.
    pub fn convert_value<V: IntoMagnitude>(
        &mut self,
        category: &str,
        from_unit: &str,
        to_unit: &str,
        value: V,
    ) -> Result<ConversionResult, ConversionError> {
        match convert_with_decimals(category, from_unit, to_unit, value, self.decimals) {
            Ok(result) => {
                debug!(
                    category = %result.category,
                    from = %result.from_unit,
                    to = %result.to_unit,
                    value = result.to_value,
                    "converted"
                );
                self.history.record(result.clone());
                self.persist_history();
                Ok(result)
            }
            Err(e) => {
                debug!(error = %e, "conversion rejected");
                Err(e)
            }
        }
    }

    /// Favorite the unit pair of the last successful conversion.
    /// Returns false with no result, a failed result, or a duplicate.
    pub fn add_to_favorites(&mut self) -> bool {
        let added = match &self.state.result {
            Some(Ok(result)) => self.favorites.add(result),
            _ => false,
        };
        if added {
            self.persist_favorites();
        }
        added
    }

    /// Favorite a unit pair directly. `Ok(false)` means it was already present.
    pub fn favorite_units(
        &mut self,
        category: &str,
        from_unit: &str,
        to_unit: &str,
    ) -> Result<bool, ConversionError> {
        let id: CategoryId = category.parse()?;
        let from = REGISTRY.get_unit(category, from_unit)?;
        let to = REGISTRY.get_unit(category, to_unit)?;
        let added = self.favorites.insert(Favorite::new(id, from, to));
        if added {
            self.persist_favorites();
        }
        Ok(added)
    }

    pub fn remove_favorite(&mut self, id: &str) -> bool {
        let removed = self.favorites.remove(id);
        if removed {
            self.persist_favorites();
        }
        removed
    }

    /// Load a favorite's category and units with a value of 1
    pub fn use_favorite(&mut self, id: &str) -> bool {
        let Some(favorite) = self.favorites.find(id).cloned() else {
            return false;
        };
        self.state = ConverterState {
            category: favorite.category,
            from_unit: favorite.from_unit,
            to_unit: favorite.to_unit,
            from_value: "1".to_string(),
            result: None,
        };
        true
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        if let Err(e) = self.store.remove(CONVERSIONS_KEY) {
            warn!(error = %e, "failed to remove stored history");
            self.storage_error = Some(e);
        }
        info!("conversion history cleared");
    }

    fn persist_history(&mut self) {
        if let Err(e) = save_json(&mut self.store, CONVERSIONS_KEY, &self.history.to_vec()) {
            warn!(error = %e, "failed to persist conversion history");
            self.storage_error = Some(e);
        }
    }

    fn persist_favorites(&mut self) {
        if let Err(e) = save_json(&mut self.store, FAVORITES_KEY, self.favorites.list()) {
            warn!(error = %e, "failed to persist favorites");
            self.storage_error = Some(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::DEFAULT_CAPACITY;
    use unitkit_core::NumberError;

    fn session() -> ConverterSession<MemoryStore> {
        ConverterSession::load(MemoryStore::new(), DEFAULT_CAPACITY)
    }

    /// Reads succeed with nothing stored, writes always fail
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }
        fn set(&mut self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::InvalidKey(key.to_string()))
        }
        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            Err(StoreError::InvalidKey(key.to_string()))
        }
    }

    #[test]
    fn test_default_state() {
        let s = session();
        assert_eq!(s.state().category, CategoryId::Length);
        assert_eq!(s.state().from_unit, "m");
        assert_eq!(s.state().to_unit, "km");
        assert_eq!(s.state().from_value, "1");
        assert!(s.state().result.is_none());
        assert!(s.history().is_empty());
    }

    #[test]
    fn test_convert_records_history() {
        let mut s = session();
        s.set_from_value("1000");
        let result = s.convert().unwrap();
        assert_eq!(result.to_value, 1.0);
        assert_eq!(s.state().result, Some(Ok(result)));
        assert_eq!(s.history().len(), 1);

        let stored: Vec<ConversionRecord> = load_json(s.store(), CONVERSIONS_KEY).unwrap().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].result.from_value, 1000.0);
    }

    #[test]
    fn test_failed_convert_not_recorded() {
        let mut s = session();
        s.set_from_value("abc");
        let err = s.convert().unwrap_err();
        assert!(matches!(err, ConversionError::InvalidValue(NumberError::ParseError(_))));
        assert!(matches!(s.state().result, Some(Err(_))));
        assert!(s.history().is_empty());
        assert_eq!(s.store().get(CONVERSIONS_KEY).unwrap(), None);
    }

    #[test]
    fn test_set_category_selects_first_two_units() {
        let mut s = session();
        s.convert().unwrap();
        s.set_category("temperature").unwrap();
        assert_eq!(s.state().category, CategoryId::Temperature);
        assert_eq!(s.state().from_unit, "c");
        assert_eq!(s.state().to_unit, "f");
        assert!(s.state().result.is_none());

        assert!(matches!(s.set_category("mass"), Err(ConversionError::InvalidCategory(_))));
        assert_eq!(s.state().category, CategoryId::Temperature);
    }

    #[test]
    fn test_selection_changes_clear_result() {
        let mut s = session();
        s.convert().unwrap();
        s.swap_units();
        assert!(s.state().result.is_none());
        assert_eq!(s.state().from_unit, "km");
        assert_eq!(s.state().to_unit, "m");

        s.convert().unwrap();
        s.set_to_unit("cm");
        assert!(s.state().result.is_none());
        s.convert().unwrap();
        s.set_from_unit("mi");
        assert!(s.state().result.is_none());
    }

    #[test]
    fn test_favorites_require_successful_result() {
        let mut s = session();
        assert!(!s.add_to_favorites());

        s.set_from_value("");
        s.convert().unwrap_err();
        assert!(!s.add_to_favorites());

        s.set_from_value("5");
        s.convert().unwrap();
        assert!(s.add_to_favorites());
        assert!(!s.add_to_favorites());
        assert_eq!(s.favorites().len(), 1);

        let stored: Vec<Favorite> = load_json(s.store(), FAVORITES_KEY).unwrap().unwrap();
        assert_eq!(stored[0].from_unit, "m");
    }

    #[test]
    fn test_use_and_remove_favorite() {
        let mut s = session();
        assert!(s.favorite_units("weight", "kg", "lb").unwrap());
        assert!(!s.favorite_units("weight", "kg", "lb").unwrap());
        assert!(matches!(
            s.favorite_units("weight", "kg", "stone"),
            Err(ConversionError::InvalidUnit { .. })
        ));

        let id = s.favorites().list()[0].id.clone();
        s.set_from_value("42");
        assert!(s.use_favorite(&id));
        assert_eq!(s.state().category, CategoryId::Weight);
        assert_eq!(s.state().from_unit, "kg");
        assert_eq!(s.state().to_unit, "lb");
        assert_eq!(s.state().from_value, "1");

        assert!(s.remove_favorite(&id));
        assert!(!s.use_favorite(&id));
        assert!(s.favorites().is_empty());
    }

    #[test]
    fn test_reload_restores_state() {
        let mut s = session();
        s.convert_value("temperature", "c", "f", 100.0).unwrap();
        s.favorite_units("speed", "kph", "mph").unwrap();

        let reloaded = ConverterSession::load(s.into_store(), DEFAULT_CAPACITY);
        assert_eq!(reloaded.history().len(), 1);
        assert_eq!(reloaded.history().latest().map(|r| r.result.to_value), Some(212.0));
        assert_eq!(reloaded.favorites().len(), 1);
    }

    #[test]
    fn test_corrupt_storage_loads_empty() {
        let mut store = MemoryStore::new();
        store.set(CONVERSIONS_KEY, "{oops").unwrap();
        store.set(FAVORITES_KEY, "42").unwrap();
        let s = ConverterSession::load(store, DEFAULT_CAPACITY);
        assert!(s.history().is_empty());
        assert!(s.favorites().is_empty());
    }

    #[test]
    fn test_clear_history_removes_key() {
        let mut s = session();
        s.convert().unwrap();
        assert!(s.store().get(CONVERSIONS_KEY).unwrap().is_some());
        s.clear_history();
        assert!(s.history().is_empty());
        assert_eq!(s.store().get(CONVERSIONS_KEY).unwrap(), None);
    }

    #[test]
    fn test_storage_failures_are_not_fatal() {
        let mut s = ConverterSession::load(BrokenStore, DEFAULT_CAPACITY);
        s.convert().unwrap();
        assert!(matches!(s.take_storage_error(), Some(StoreError::InvalidKey(_))));
        assert!(s.take_storage_error().is_none());

        assert!(s.add_to_favorites());
        assert!(s.take_storage_error().is_some());
        s.clear_history();
        assert!(s.take_storage_error().is_some());

        assert!(s.history().is_empty());
        assert_eq!(s.favorites().len(), 1);
    }

    #[test]
    fn test_no_storage_error_on_healthy_store() {
        let mut s = session();
        s.convert().unwrap();
        assert!(s.add_to_favorites());
        s.clear_history();
        assert!(s.take_storage_error().is_none());
    }

    #[test]
    fn test_decimals_apply() {
        let mut s = session().with_decimals(2);
        let result = s.convert_value("length", "in", "m", "1").unwrap();
        assert_eq!(result.to_value, 0.03);
    }
}
