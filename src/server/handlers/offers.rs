use axum::body::Bytes;
use axum::extract::{Extension, Json};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum_macros::debug_handler;
use serde::Serialize;

use crate::entities::{Acceptance, RideSnapshot};
use crate::error::{method_not_allowed_error, Error};
use crate::server::cors::with_cors_headers;
use crate::server::{gate, DynAPI, DynIdentityProvider, GateOptions};

#[derive(Debug, Serialize)]
pub struct AcceptOfferResponse {
    success: bool,
    #[serde(flatten)]
    acceptance: Acceptance,
    ride: Option<RideSnapshot>,
}

#[debug_handler]
pub async fn accept(
    method: Method,
    headers: HeaderMap,
    Extension(api): Extension<DynAPI>,
    Extension(identity): Extension<DynIdentityProvider>,
    Extension(options): Extension<GateOptions>,
    body: Bytes,
) -> Response {
    let response = match method {
        Method::OPTIONS => StatusCode::OK.into_response(),
        Method::POST => accept_offer(&api, &identity, options, &headers, &body)
            .await
            .into_response(),
        _ => method_not_allowed_error().into_response(),
    };

    with_cors_headers(response)
}

async fn accept_offer(
    api: &DynAPI,
    identity: &DynIdentityProvider,
    options: GateOptions,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Json<AcceptOfferResponse>, Error> {
    let user = gate::authenticate(identity.as_ref(), headers, options.identity_timeout).await?;
    let offer_id = gate::parse_offer_id(body)?;

    let acceptance = api.accept_offer(user.clone(), offer_id).await?;

    // the acceptance is committed; nothing below may turn it into a failure
    api.announce_acceptance(&acceptance).await;

    let ride = match api.find_ride(user, acceptance.ride_id).await {
        Ok(ride) => Some(ride.snapshot()),
        Err(err) => {
            tracing::warn!(error = %err, ride_id = %acceptance.ride_id, "ride snapshot unavailable");
            None
        }
    };

    Ok(Json(AcceptOfferResponse {
        success: true,
        acceptance,
        ride,
    }))
}
