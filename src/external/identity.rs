use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::User,
    error::{unauthorized_error, upstream_error, Error},
};

/// Resolves a bearer credential to the subject it was issued for.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, token: &str) -> Result<User, Error>;
}

#[derive(Clone, Debug, Deserialize)]
struct IdentityResponse {
    id: Uuid,
}

/// Verifies tokens against the hosted auth service's `/auth/v1/user` endpoint.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl HttpIdentityProvider {
    pub fn new(api_base: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base,
            api_key,
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    #[tracing::instrument(skip_all)]
    async fn verify(&self, token: &str) -> Result<User, Error> {
        let url = format!("{}/auth/v1/user", self.api_base.trim_end_matches('/'));

        let res = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await?;

        let status_code = res.status().as_u16();

        if (400..500).contains(&status_code) {
            tracing::debug!(status_code, "identity provider rejected credential");
            return Err(unauthorized_error());
        } else if status_code != 200 {
            tracing::error!(status_code, "identity provider failed");
            return Err(upstream_error());
        }

        let data: IdentityResponse = res.json().await.map_err(|err| {
            tracing::warn!(error = %err, "malformed identity response");
            unauthorized_error()
        })?;

        Ok(User::new(data.id))
    }
}
