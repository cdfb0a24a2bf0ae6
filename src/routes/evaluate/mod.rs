pub mod routes;

use serde::Deserialize;
use serde_json::{Map, Value};

// Runtime evaluation request: validated here at the boundary, the
// engine assumes well-typed input past this point
#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub flag_key: String,
    pub user_attributes: Map<String, Value>,
}
