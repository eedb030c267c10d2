use thiserror::Error;

/// Error type for console operations.
///
/// Everything the core does ultimately talks to the portal, so most
/// failures are API errors; the frontends map these into their own
/// user-facing diagnostics.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A portal request failed.
    #[error(transparent)]
    Api(#[from] fluxforge_api::Error),
}

impl CoreError {
    /// The server-supplied `detail` message, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Api(e) => e.detail(),
        }
    }

    /// Returns `true` if the underlying failure was a 404.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Api(e) => e.is_not_found(),
        }
    }
}
