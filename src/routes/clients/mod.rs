pub mod routes;

use serde::{Deserialize, Serialize};

use crate::store::clients::Client;

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub client: Client,
    // Plaintext API key, shown once at creation and never again
    pub api_key: String,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub client: Client,
}
