use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};

use emoney_core::{AccountId, NewTransaction, Page, PageRequest, Transaction};
use emoney_http::{ApiError, AuthenticatedAccount};

use crate::app::dto;
use crate::service::TransactionService;

pub async fn create_transaction(
    Extension(transactions): Extension<Arc<TransactionService>>,
    caller: AuthenticatedAccount,
    payload: Result<Json<NewTransaction>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let Json(request) = payload?;
    let tx = transactions
        .record_transaction(caller.claims(), request)
        .await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn account_history(
    Extension(transactions): Extension<Arc<TransactionService>>,
    caller: AuthenticatedAccount,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<dto::HistoryQuery>, QueryRejection>,
) -> Result<Json<Page<Transaction>>, ApiError> {
    let Path(raw_id) = path?;
    let Query(query) = query?;
    let account: AccountId = raw_id.parse()?;
    let page = PageRequest::from_query(query.page, query.limit)?;

    Ok(Json(
        transactions.history(caller.claims(), account, page).await?,
    ))
}
