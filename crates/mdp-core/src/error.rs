/// Fatal startup conditions (spec.md §7 "Configuration", "Resource").
/// Policy for both is identical: print a diagnostic and abort before any
/// worker thread starts.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("resource error: {0}")]
    Resource(String),
    #[error(transparent)]
    Transport(#[from] mdp_transport::TransportError),
}
