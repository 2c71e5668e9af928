use ferry_watch::WatchError;

/// Failures of the vendor workflow. The soft "export still processing"
/// state is not an error; it is a value ([`crate::AcquireOutcome`]).
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// The vendor kept us on the sign-in page after submitting
    /// credentials.
    #[error("vendor rejected the sign-in for {email}")]
    Auth { email: String },

    /// The orders listing did not yield an order identifier.
    #[error("could not read an order id from the orders listing")]
    MissingOrderId,

    /// The workflow needs a page or selector the configuration does not
    /// provide.
    #[error("incomplete configuration: {0}")]
    Config(&'static str),

    /// Terminal detector failure (empty artifact, cancellation, I/O).
    #[error(transparent)]
    Watch(#[from] WatchError),

    /// Browser/WebDriver failure underneath an operation.
    #[error("browser driver failure: {0}")]
    Driver(#[from] anyhow::Error),
}
