//! HTTP client for the name-prediction oracle.
//!
//! One blocking round trip per file: POST the aggregated query list, receive
//! ranked candidates. The oracle is opaque; a non-success status aborts
//! recovery for that file only.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

/// One ranked name prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub confidence: f64,
    pub name: String,
    /// Index into the query list this prediction belongs to.
    pub index: usize,
}

/// Parsed oracle response: per-variable ranked candidate lists aligned with
/// the query list, plus optional oracle-side timing.
#[derive(Debug)]
pub struct OracleResponse {
    pub predictions: Vec<Vec<Candidate>>,
    pub queries: Vec<String>,
    pub oracle_time_ms: Option<f64>,
}

impl OracleResponse {
    /// The wire shape is a three-element array: `[predictions, queries,
    /// time]`, each prediction a `[confidence, name, index]` triple.
    pub fn from_value(value: Value) -> Result<Self> {
        let parts = value
            .as_array()
            .ok_or_else(|| Error::OracleResponse("expected a top-level array".into()))?;
        if parts.len() < 2 {
            return Err(Error::OracleResponse(format!(
                "expected at least 2 elements, got {}",
                parts.len()
            )));
        }
        let raw: Vec<Vec<(f64, String, usize)>> = serde_json::from_value(parts[0].clone())?;
        let predictions = raw
            .into_iter()
            .map(|list| {
                list.into_iter()
                    .map(|(confidence, name, index)| Candidate {
                        confidence,
                        name,
                        index,
                    })
                    .collect()
            })
            .collect();
        let queries: Vec<String> = serde_json::from_value(parts[1].clone())?;
        let oracle_time_ms = parts.get(2).and_then(Value::as_f64);
        Ok(Self {
            predictions,
            queries,
            oracle_time_ms,
        })
    }
}

/// Blocking oracle client with connect and request timeouts.
#[derive(Debug, Clone)]
pub struct OracleClient {
    http: reqwest::blocking::Client,
    url: String,
}

impl OracleClient {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("namely/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            url: format!("http://{host}:{port}"),
        })
    }

    /// Send one batch of queries and parse the ranked candidates.
    pub fn predict(&self, queries: &[String]) -> Result<OracleResponse> {
        debug!(count = queries.len(), url = %self.url, "sending oracle query batch");
        let response = self
            .http
            .post(&self.url)
            .json(&serde_json::json!({ "tests": queries }))
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::OracleStatus {
                status: status.as_u16(),
            });
        }
        let body: Value = response.json()?;
        let parsed = OracleResponse::from_value(body)?;
        if let Some(ms) = parsed.oracle_time_ms {
            debug!(oracle_time_ms = ms, "oracle timing");
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_response() {
        let value = json!([
            [[[0.9, "count", 0], [0.5, "total", 0]], [[0.8, "node", 1]]],
            ["ID:1:a START var", "ID:2:b var ="],
            12.5
        ]);
        let resp = OracleResponse::from_value(value).unwrap();
        assert_eq!(resp.predictions.len(), 2);
        assert_eq!(resp.predictions[0][0].name, "count");
        assert_eq!(resp.predictions[0][1].confidence, 0.5);
        assert_eq!(resp.predictions[1][0].index, 1);
        assert_eq!(resp.queries.len(), 2);
        assert_eq!(resp.oracle_time_ms, Some(12.5));
    }

    #[test]
    fn test_parse_response_without_timing() {
        let value = json!([[[[1.0, "n", 0]]], ["ID:1:a x"]]);
        let resp = OracleResponse::from_value(value).unwrap();
        assert_eq!(resp.oracle_time_ms, None);
    }

    #[test]
    fn test_malformed_response_rejected() {
        assert!(OracleResponse::from_value(json!({"not": "an array"})).is_err());
        assert!(OracleResponse::from_value(json!([[]])).is_err());
    }
}
