use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SendMessageParams {
    #[schemars(description = "What the traveler said, in any language")]
    pub text: String,
}
