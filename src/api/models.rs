use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::models::User;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserByPhoneRequest {
    pub phone_number: String,
}

#[derive(Serialize)]
pub struct GetUserByPhoneResponse {
    pub success: bool,
    pub user: User,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}
