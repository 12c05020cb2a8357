//! Sending a generated operation to where it can run.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{response::Variables, Error};

/// The body of a GraphQL over HTTP request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphqlRequest {
    pub query: String,
    pub variables: Variables,
}

/// A GraphQL response, as it came back.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphqlResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<serde_json::Value>>,
}

/// Something that runs GraphQL operations, over the network or in process.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, request: GraphqlRequest) -> Result<GraphqlResponse, Error>;
}

/// Posts operations as JSON to a GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: reqwest::Client,
    url: Url,
    headers: Vec<(String, String)>,
}

impl HttpExecutor {
    pub fn new(url: Url, headers: Vec<(String, String)>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            headers,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn header_map(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("gqlpt"));

        for (name, value) in &self.headers {
            let name = HeaderName::try_from(name.as_str()).map_err(|err| Error::Execution(err.to_string()))?;
            let value = HeaderValue::try_from(value.as_str()).map_err(|err| Error::Execution(err.to_string()))?;

            headers.insert(name, value);
        }

        Ok(headers)
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn execute(&self, request: GraphqlRequest) -> Result<GraphqlResponse, Error> {
        let response = self
            .client
            .post(self.url.clone())
            .headers(self.header_map()?)
            .json(&request)
            .send()
            .await
            .map_err(|err| Error::Execution(err.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Execution(format!("{status}: {body}")));
        }

        response
            .json::<GraphqlResponse>()
            .await
            .map_err(|err| Error::Execution(err.to_string()))
    }
}
