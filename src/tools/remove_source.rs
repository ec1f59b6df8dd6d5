use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RemoveSourceParams {
    #[schemars(description = "Id of the source to delete from the catalog")]
    pub id: String,
}
