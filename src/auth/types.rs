//! Request and response bodies for the auth service. The completion bodies
//! carry passwords and verification bodies carry codes: never log them.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StartRequest {
    pub email: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StartResponse {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResendRequest {
    pub email: String,
}

#[derive(Serialize, Deserialize)]
pub struct CompleteRegistrationRequest {
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct CompletePasswordResetRequest {
    pub email: String,
    pub password: String,
}
