//! unitkit History - Conversion history, favorites and the converter session
//!
//! Everything here is persisted through a [`KeyValueStore`] as JSON lists
//! under the `unit-converter.*` keys.

mod store;
mod record;
mod history;
mod favorites;
mod session;

pub use store::{
    load_json, save_json, FileStore, KeyValueStore, MemoryStore, StoreError, CONVERSIONS_KEY,
    FAVORITES_KEY,
};
pub use record::ConversionRecord;
pub use history::{ConversionHistory, DEFAULT_CAPACITY};
pub use favorites::{Favorite, Favorites};
pub use session::{ConverterSession, ConverterState};
