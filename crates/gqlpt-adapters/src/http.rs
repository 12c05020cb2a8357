use std::time::Duration;

use gqlpt::AdapterError;
use serde::{de::DeserializeOwned, Serialize};

pub(crate) fn client(timeout: Duration) -> Result<reqwest::Client, AdapterError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| AdapterError::Request(format!("cannot create the HTTP client: {err}")))
}

/// Posts `body` as JSON and decodes the answer. Error statuses carry the response body.
pub(crate) async fn post_json<B, R>(request: reqwest::RequestBuilder, body: &B) -> Result<R, AdapterError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|err| AdapterError::Request(err.to_string()))?;

    let status = response.status();
    let raw_body = response
        .text()
        .await
        .map_err(|err| AdapterError::Request(err.to_string()))?;

    if !status.is_success() {
        return Err(AdapterError::Request(format!("{status}: {raw_body}")));
    }

    serde_json::from_str(&raw_body).map_err(|err| AdapterError::InvalidResponse(err.to_string()))
}

pub(crate) fn trimmed_base_url(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}
