use serde::{Deserialize, Serialize};

use emoney_core::AccountId;

// -------------------------
// Request DTOs
// -------------------------

// No `Debug` on anything carrying a password.

#[derive(Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct CreateAccountResponse {
    pub id: AccountId,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
}
