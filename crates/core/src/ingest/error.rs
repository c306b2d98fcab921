use std::fmt;

/// Non-success HTTP response from the ratings feed, kept for diagnostics.
#[derive(Debug, Clone)]
pub struct ProviderHttpError {
    pub provider: &'static str,
    pub status: u16,
    pub raw_body: String,
}

impl ProviderHttpError {
    /// Rate limiting and server-side failures may clear up on their own; other
    /// client errors (bad token, bad cursor) will not.
    pub fn is_retryable(&self) -> bool {
        self.status == 429 || self.status >= 500
    }
}

impl fmt::Display for ProviderHttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ratings provider error (provider={}, status={}): {}",
            self.provider, self.status, self.raw_body
        )
    }
}

impl std::error::Error for ProviderHttpError {}
