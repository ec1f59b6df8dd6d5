//! MCP `suggest_places` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SuggestPlacesParams {
    #[schemars(description = "Minutes of free time to fill (>= 0)")]
    pub free_time_min: i64,

    #[schemars(description = "Anchor id of the current location, e.g. 'anchor_covent_garden'. Defaults to the session anchor.")]
    pub anchor_id: Option<String>,

    #[schemars(description = "Optional free-text hint; category keywords in it boost matching places")]
    pub message: Option<String>,
}
