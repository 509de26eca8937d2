use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::Config;

use super::api_types::ApiGraphqlResponse;
use super::queries::operation_name;

/// Failures of the network collaborator, surfaced to callers unchanged.
#[derive(Debug, Error)]
pub enum ClientError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("server returned {status}: {body}")]
  Status { status: u16, body: String },

  #[error("query failed: {}", .0.join("; "))]
  Graphql(Vec<String>),

  #[error("response contained no data")]
  EmptyResponse,

  #[error("unexpected response shape at {path}: {source}")]
  Decode {
    path: String,
    source: serde_json::Error,
  },
}

/// Executes one GraphQL document and returns its `data` object.
pub trait GraphqlExecutor {
  async fn execute(&self, query: &str, variables: Value) -> Result<Value, ClientError>;
}

/// Decode the value found at a JSON pointer (`/workspace/labels`) in `data`.
pub fn decode_at<T: DeserializeOwned>(data: &Value, pointer: &str) -> Result<T, ClientError> {
  let value = data.pointer(pointer).cloned().unwrap_or(Value::Null);
  serde_json::from_value(value).map_err(|source| ClientError::Decode {
    path: pointer.to_string(),
    source,
  })
}

/// GraphQL-over-HTTP client with bearer authentication.
#[derive(Clone)]
pub struct GraphqlClient {
  http: reqwest::Client,
  endpoint: Url,
  token: String,
}

impl GraphqlClient {
  pub fn new(endpoint: &str, token: String) -> Result<Self> {
    let endpoint =
      Url::parse(endpoint).map_err(|e| eyre!("Invalid API URL '{}': {}", endpoint, e))?;

    let http = reqwest::Client::builder()
      .user_agent(concat!("zh/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      endpoint,
      token,
    })
  }

  /// Client for the ZenHub API described in configuration.
  pub fn zenhub(config: &Config) -> Result<Self> {
    Self::new(&config.zenhub.url, Config::get_api_token()?)
  }
}

impl GraphqlExecutor for GraphqlClient {
  async fn execute(&self, query: &str, variables: Value) -> Result<Value, ClientError> {
    let operation = operation_name(query);
    debug!(operation, endpoint = %self.endpoint, "executing query");

    let response = self
      .http
      .post(self.endpoint.clone())
      .bearer_auth(&self.token)
      .json(&json!({ "query": query, "variables": variables }))
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(ClientError::Status {
        status: status.as_u16(),
        body,
      });
    }

    let body: ApiGraphqlResponse = response.json().await?;
    if !body.errors.is_empty() {
      return Err(ClientError::Graphql(
        body.errors.into_iter().map(|e| e.message).collect(),
      ));
    }

    body.data.ok_or(ClientError::EmptyResponse)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_decode_at_reports_path() {
    let data = json!({"workspace": null});
    let err = decode_at::<Vec<String>>(&data, "/workspace/labels").unwrap_err();
    assert!(matches!(err, ClientError::Decode { ref path, .. } if path == "/workspace/labels"));
  }

  #[test]
  fn test_decode_at_optional_missing_is_none() {
    let data = json!({"node": null});
    let issue: Option<String> = decode_at(&data, "/node").unwrap();
    assert_eq!(issue, None);
  }

  #[test]
  fn test_graphql_error_message_joins() {
    let err = ClientError::Graphql(vec!["first".to_string(), "second".to_string()]);
    assert_eq!(err.to_string(), "query failed: first; second");
  }

  #[test]
  fn test_invalid_endpoint_rejected() {
    assert!(GraphqlClient::new("not a url", "token".to_string()).is_err());
  }
}
