use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ResetSessionParams {
    #[schemars(description = "Also delete every catalog source (default: false)")]
    pub include_catalog: Option<bool>,

    #[schemars(description = "Must be true; reset cannot be undone")]
    pub confirm: bool,
}
