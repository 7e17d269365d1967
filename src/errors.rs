// Error types for segwatch

use crate::monitor::PollOutput;
use snafu::Snafu;
use std::{io, sync::mpsc::SendError};

#[derive(Debug, Snafu)]
pub enum SegwatchError {
    // Validation errors for user input
    #[snafu(display("Invalid manifest URL: {url}"))]
    InvalidManifestUrl { url: String },
    #[snafu(display("Monitoring sessions cannot be started in global polling mode"))]
    UnsupportedInGlobalMode,
    #[snafu(display("Global polling is not available while monitoring sessions"))]
    UnsupportedInSessionMode,

    // Errors talking to the monitoring server
    #[snafu(display("Could not build HTTP client"))]
    HttpClientError { source: reqwest::Error },
    #[snafu(display("Request to {endpoint} failed"))]
    TransportError {
        endpoint: String,
        source: reqwest::Error,
    },
    #[snafu(display("{endpoint} returned HTTP {status}"))]
    UnexpectedStatus { endpoint: String, status: u16 },
    #[snafu(display("Start request for {url} ended without an answer"))]
    StartRequestLost { url: String },
    #[snafu(display("Monitoring session {session_id} not found on server"))]
    SessionNotFound { session_id: String },

    // Errors decoding poll responses
    #[snafu(display("Response from {endpoint} is not a JSON array of segments"))]
    InvalidResponseShape {
        endpoint: String,
        source: serde_json::Error,
    },

    // Errors while broadcasting poll results to the dashboard
    #[snafu(display("Error broadcasting poll output"))]
    PollBroadcastError { source: Box<SendError<PollOutput>> },

    // Errors for the recorder, the recording loader and the HTML export
    #[snafu(display("Error writing recording file"))]
    WriterError { source: io::Error },
    #[snafu(display("Error loading recording file"))]
    RecordingLoaderError { source: io::Error },
    #[snafu(display("Invalid recording file: {path}"))]
    InvalidRecordingFile { path: String },
    #[snafu(display("Error writing HTML export"))]
    ExportError { source: io::Error },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },
}

impl From<SendError<PollOutput>> for SegwatchError {
    fn from(value: SendError<PollOutput>) -> Self {
        SegwatchError::PollBroadcastError {
            source: Box::new(value),
        }
    }
}
