use thiserror::Error;

/// Why a weather lookup failed.
///
/// The orchestrator never surfaces these; every variant resolves to the
/// dummy result. They exist so providers can be tested and failures logged.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {provider} failed: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} request failed with status {status}: {body}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse {provider} response: {source}")]
    Parse {
        provider: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
