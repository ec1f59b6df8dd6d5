//! Parameters shared by the `forget_category` and `restore_category` tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CategoryParams {
    #[schemars(description = "Category tag, e.g. 'cafe', 'museum', 'park'")]
    pub category: String,

    #[schemars(description = "forget_category only: re-run the most recent suggestion afterwards (default: false)")]
    pub resuggest: Option<bool>,
}
