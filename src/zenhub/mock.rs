//! Canned network collaborator for tests.

use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::client::{ClientError, GraphqlExecutor};
use super::queries::operation_name;

/// Serves queued responses per operation name and records every call.
///
/// The last queued response for an operation is repeated once the queue
/// is down to one entry.
#[derive(Default)]
pub struct MockExecutor {
  responses: Mutex<HashMap<String, VecDeque<Result<Value, String>>>>,
  calls: Mutex<Vec<(String, Value)>>,
}

impl MockExecutor {
  pub fn new() -> Self {
    Self::default()
  }

  /// Queue `data` as the response to `operation`.
  pub fn respond(self, operation: &str, data: Value) -> Self {
    self.push(operation, Ok(data));
    self
  }

  /// Queue a GraphQL error as the response to `operation`.
  pub fn fail(self, operation: &str, message: &str) -> Self {
    self.push(operation, Err(message.to_string()));
    self
  }

  /// Replace everything queued for `operation` with `data`.
  pub fn set_response(&self, operation: &str, data: Value) {
    let mut responses = self.responses.lock().unwrap();
    responses.insert(operation.to_string(), VecDeque::from([Ok(data)]));
  }

  fn push(&self, operation: &str, response: Result<Value, String>) {
    let mut responses = self.responses.lock().unwrap();
    responses
      .entry(operation.to_string())
      .or_default()
      .push_back(response);
  }

  /// Number of calls made for `operation`.
  pub fn calls(&self, operation: &str) -> usize {
    let calls = self.calls.lock().unwrap();
    calls.iter().filter(|(op, _)| op == operation).count()
  }

  /// Total number of calls made.
  pub fn total_calls(&self) -> usize {
    self.calls.lock().unwrap().len()
  }

  /// Variables passed on the most recent call for `operation`.
  pub fn last_variables(&self, operation: &str) -> Option<Value> {
    let calls = self.calls.lock().unwrap();
    calls
      .iter()
      .rev()
      .find(|(op, _)| op == operation)
      .map(|(_, v)| v.clone())
  }
}

impl GraphqlExecutor for MockExecutor {
  async fn execute(&self, query: &str, variables: Value) -> Result<Value, ClientError> {
    let operation = operation_name(query).to_string();
    self
      .calls
      .lock()
      .unwrap()
      .push((operation.clone(), variables));

    let mut responses = self.responses.lock().unwrap();
    let queue = responses.get_mut(&operation).ok_or_else(|| {
      ClientError::Graphql(vec![format!("no mock response for {}", operation)])
    })?;
    let response = if queue.len() > 1 {
      queue.pop_front()
    } else {
      queue.front().cloned()
    };

    match response {
      Some(Ok(data)) => Ok(data),
      Some(Err(message)) => Err(ClientError::Graphql(vec![message])),
      None => Err(ClientError::Graphql(vec![format!(
        "no mock response for {}",
        operation
      )])),
    }
  }
}
