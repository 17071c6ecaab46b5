//! Conversion records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unitkit_units::ConversionResult;
use uuid::Uuid;

/// A successful conversion as kept in history. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub result: ConversionResult,
}

impl ConversionRecord {
    pub fn new(result: ConversionResult) -> Self {
        Self::at(result, Utc::now())
    }

    pub fn at(result: ConversionResult, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: format!("conv-{}", Uuid::new_v4().simple()),
            timestamp,
            result,
        }
    }
}
