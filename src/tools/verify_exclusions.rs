use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for `list_exclusions` and `verify_exclusions`.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ExclusionQueryParams {
    #[schemars(description = "Include this many recent ledger changes (list_exclusions only)")]
    pub history: Option<usize>,
}
