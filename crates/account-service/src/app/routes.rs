use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Extension, Path,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

use emoney_core::{AccountId, AccountProfile};
use emoney_http::{ApiError, AuthenticatedAccount};

use crate::app::dto;
use crate::service::AccountService;

pub async fn create_account(
    Extension(accounts): Extension<Arc<AccountService>>,
    payload: Result<Json<dto::CreateAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<dto::CreateAccountResponse>), ApiError> {
    let Json(body) = payload?;
    let id = accounts
        .create_account(&body.name, &body.email, &body.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(dto::CreateAccountResponse {
            id,
            message: "account created",
        }),
    ))
}

pub async fn login(
    Extension(accounts): Extension<Arc<AccountService>>,
    payload: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> Result<Json<dto::LoginResponse>, ApiError> {
    let Json(body) = payload?;
    let access_token = accounts.login(&body.email, &body.password).await?;
    Ok(Json(dto::LoginResponse { access_token }))
}

pub async fn get_account(
    Extension(accounts): Extension<Arc<AccountService>>,
    caller: AuthenticatedAccount,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<AccountProfile>, ApiError> {
    let Path(raw_id) = path?;
    let id: AccountId = raw_id.parse()?;
    caller.authorize(id)?;

    Ok(Json(accounts.get_account(id).await?))
}
