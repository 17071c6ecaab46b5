//! Evaluation Context

use unitkit_core::DISPLAY_DECIMALS;

/// Evaluation context passed to plugins
#[derive(Debug, Clone)]
pub struct EvalContext {
    /// Decimal places numeric results are rounded to
    pub decimals: u32,
}

impl EvalContext {
    pub fn new() -> Self {
        Self { decimals: DISPLAY_DECIMALS }
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}
