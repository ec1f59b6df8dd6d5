//! MCP `list_sources` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `list_sources` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListSourcesParams {
    /// Restrict the listing to one category.
    #[schemars(description = "Optional category to filter by")]
    pub category: Option<String>,

    #[schemars(description = "Leave out sources whose category is excluded (default: false)")]
    pub hide_excluded: Option<bool>,
}
