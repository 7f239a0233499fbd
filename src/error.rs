//! Error taxonomy.
//!
//! "No data found" and "path does not fit the map" are ordinary validation
//! outcomes, not errors; they surface as `false`/`None` on the outcome
//! types. Only precondition violations and repository-layer failures
//! propagate as `RoutingError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoutingError {
    /// An upstream guarantee was broken, e.g. a constructed fare carries an
    /// add-on routing map but no gateway city to split the travel path at.
    #[error("precondition violated: {0}")]
    MissingPrecondition(String),

    /// The repository collaborator failed in a non-recoverable way.
    #[error("repository failure: {0}")]
    Repository(String),
}
