//! Public types for the auth API
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug)]
pub struct VerifyRequest {
    #[serde(default)]
    pub password: String,
}
