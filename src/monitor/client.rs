use std::time::Duration;

use log::debug;
use reqwest::{
    StatusCode,
    blocking::{Client, Response},
    header::CACHE_CONTROL,
};
use serde::Serialize;

use crate::{SegwatchError, session::SessionId};

use super::{PollMode, SegmentRecord};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

const MONITOR_ENDPOINT: &str = "monitor";
const START_MONITORING_ENDPOINT: &str = "startMonitoring";
const STOP_MONITORING_ENDPOINT: &str = "stopMonitoring";

/// The requests the dashboard makes to a monitoring server.
///
/// `HttpMonitorClient` is the real implementation. The trait exists so the poller, the
/// monitoring control and the lifecycle hook can be driven without a server.
pub trait MonitorApi: Send + Sync {
    /// Asks the server to start monitoring `manifest_url` on behalf of `session_id`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status. The response body is ignored.
    fn start_monitoring(
        &self,
        manifest_url: &str,
        session_id: &SessionId,
    ) -> Result<(), SegwatchError>;

    /// Fetches the segments the server currently holds for `mode`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status, or a body that is not a JSON
    /// array of segment records.
    fn fetch_segments(&self, mode: &PollMode) -> Result<Vec<SegmentRecord>, SegwatchError>;

    /// Tells the server the session is over. Callers are not expected to act on the result.
    fn stop_monitoring(&self, session_id: &SessionId) -> Result<(), SegwatchError>;
}

#[derive(Serialize)]
struct StartMonitoringRequest<'a> {
    url: &'a str,
    id: &'a str,
}

#[derive(Serialize)]
struct StopMonitoringRequest<'a> {
    id: &'a str,
}

pub struct HttpMonitorClient {
    client: Client,
    base_url: String,
}

impl HttpMonitorClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, SegwatchError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| SegwatchError::HttpClientError { source: e })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn check_status(endpoint: &str, response: &Response) -> Result<(), SegwatchError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SegwatchError::UnexpectedStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

impl MonitorApi for HttpMonitorClient {
    fn start_monitoring(
        &self,
        manifest_url: &str,
        session_id: &SessionId,
    ) -> Result<(), SegwatchError> {
        let endpoint = self.endpoint(START_MONITORING_ENDPOINT);
        debug!("POST {} for session {}", endpoint, session_id);
        let response = self
            .client
            .post(&endpoint)
            .json(&StartMonitoringRequest {
                url: manifest_url,
                id: session_id.as_str(),
            })
            .send()
            .map_err(|e| SegwatchError::TransportError {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        Self::check_status(&endpoint, &response)
    }

    fn fetch_segments(&self, mode: &PollMode) -> Result<Vec<SegmentRecord>, SegwatchError> {
        let endpoint = self.endpoint(MONITOR_ENDPOINT);
        let mut request = self
            .client
            .get(&endpoint)
            .header(CACHE_CONTROL, "no-store");
        if let PollMode::Session(session_id) = mode {
            request = request.query(&[("id", session_id.as_str())]);
        }

        let response = request.send().map_err(|e| SegwatchError::TransportError {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        if response.status() == StatusCode::NOT_FOUND
            && let PollMode::Session(session_id) = mode
        {
            return Err(SegwatchError::SessionNotFound {
                session_id: session_id.to_string(),
            });
        }
        Self::check_status(&endpoint, &response)?;

        let body = response.text().map_err(|e| SegwatchError::TransportError {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        serde_json::from_str(&body)
            .map_err(|e| SegwatchError::InvalidResponseShape { endpoint, source: e })
    }

    fn stop_monitoring(&self, session_id: &SessionId) -> Result<(), SegwatchError> {
        let endpoint = self.endpoint(STOP_MONITORING_ENDPOINT);
        let response = self
            .client
            .post(&endpoint)
            .json(&StopMonitoringRequest {
                id: session_id.as_str(),
            })
            .send()
            .map_err(|e| SegwatchError::TransportError {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        Self::check_status(&endpoint, &response)
    }
}
