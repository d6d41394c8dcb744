//! Boundary checks that run before any shared state is touched.

use std::time::Duration;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde::Deserialize;
use tokio::time;
use uuid::Uuid;

use crate::{
    auth::User,
    error::{invalid_request_error, unauthorized_error, Error},
    external::IdentityProvider,
};

#[derive(Debug, Deserialize)]
struct AcceptOfferParams {
    #[serde(alias = "offerId")]
    offer_id: Option<String>,
}

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, Error> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(unauthorized_error)?
        .to_str()
        .map_err(|_| unauthorized_error())?;

    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(unauthorized_error)
}

#[tracing::instrument(skip_all)]
pub async fn authenticate(
    identity: &dyn IdentityProvider,
    headers: &HeaderMap,
    timeout: Duration,
) -> Result<User, Error> {
    let token = bearer_token(headers)?;

    match time::timeout(timeout, identity.verify(token)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("identity verification timed out");
            Err(unauthorized_error())
        }
    }
}

pub fn parse_offer_id(body: &[u8]) -> Result<Uuid, Error> {
    let params: AcceptOfferParams = serde_json::from_slice(body)
        .map_err(|err| invalid_request_error(format!("invalid request body: {}", err)))?;

    let offer_id = params
        .offer_id
        .ok_or_else(|| invalid_request_error("offer_id is required"))?;

    Uuid::parse_str(offer_id.trim())
        .map_err(|_| invalid_request_error("offer_id is not a valid identifier"))
}
