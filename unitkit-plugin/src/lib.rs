//! unitkit Plugin System
//!
//! Functions are pure computations registered by name with metadata, so
//! the server can list, document and call them without knowing their types.

mod traits;
mod registry;
mod context;

pub use traits::{FunctionPlugin, FunctionMeta, ArgMeta};
pub use registry::PluginRegistry;
pub use context::EvalContext;

/// Re-export core types for plugin authors
pub mod prelude {
    pub use crate::{
        FunctionPlugin, FunctionMeta, ArgMeta, PluginRegistry, EvalContext,
    };
    pub use unitkit_core::prelude::*;
}
