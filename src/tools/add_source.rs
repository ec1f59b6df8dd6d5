use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AddSourceParams {
    #[schemars(description = "Display name of the place or activity")]
    pub name: String,

    #[schemars(description = "Category tag, e.g. 'cafe', 'museum', 'market'")]
    pub category: String,

    #[schemars(description = "Optional stable id. Generated when omitted.")]
    pub id: Option<String>,

    #[schemars(description = "Free-text note shown in the suggestion reason")]
    pub memo: Option<String>,

    #[schemars(description = "Expected duration in minutes")]
    pub duration_min: Option<u32>,

    #[schemars(description = "Anchor id this place is near")]
    pub anchor_id: Option<String>,

    #[schemars(description = "Priority 1-5 (default 3)")]
    pub priority: Option<i64>,

    #[schemars(description = "Optional free-form tags")]
    pub tags: Option<Vec<String>>,
}
