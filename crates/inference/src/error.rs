use rivalwatch_core::settings::ProviderKind;

/// Longest backend error body kept in a [`ProviderError::Api`], in bytes.
const MAX_ERROR_BODY: usize = 2_000;

/// Errors from an inference backend call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: ProviderKind,
        status: u16,
        /// Response body, truncated, for the job's error column.
        body: String,
    },

    /// The backend answered 2xx but produced no text.
    #[error("{0} returned an empty completion")]
    EmptyCompletion(ProviderKind),

    /// No credentials were configured for the selected backend.
    #[error("{0} is not configured (missing API key)")]
    NotConfigured(ProviderKind),

    /// The backend could not be reached for a reason not covered above.
    #[error("{0}")]
    Unavailable(String),
}

impl ProviderError {
    /// Build an [`ProviderError::Api`], truncating the body on a char boundary.
    pub fn api(provider: ProviderKind, status: u16, mut body: String) -> Self {
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Self::Api {
            provider,
            status,
            body,
        }
    }
}

/// Return the response unchanged on 2xx, or a [`ProviderError::Api`]
/// carrying the status and body text.
pub(crate) async fn ensure_success(
    provider: ProviderKind,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ProviderError::api(provider, status.as_u16(), body));
    }
    Ok(response)
}
