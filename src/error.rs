use thiserror::Error;

/// Top-level error type for the Strake core.
#[derive(Debug, Error)]
pub enum StrakeError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Extrema(#[from] ExtremaError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors related to geometric primitives.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors raised by the extrema engine.
///
/// Both failure variants name the operand-pair kind so a caller can tell
/// which of the five query variants failed. Nothing is retried internally;
/// loosening the tolerance and retrying is a caller decision.
#[derive(Debug, Error)]
pub enum ExtremaError {
    #[error("extrema between {kind} did not converge")]
    NotConverged { kind: &'static str },

    #[error("extrema between {kind} reported done with no solutions")]
    NoSolutions { kind: &'static str },

    #[error("unsupported operand pair: {0}")]
    UnsupportedOperands(&'static str),
}

/// Errors related to the topological shape store.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("shape not found: {0}")]
    ShapeNotFound(String),

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors related to the structural part/assembly model.
#[derive(Debug, Error)]
pub enum StructureError {
    #[error("part not found: {0}")]
    PartNotFound(String),

    #[error("assembly not found: {0}")]
    AssemblyNotFound(String),
}

/// Errors related to synchronization operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("shape deleted with no replacement: {0}")]
    ShapeDeleted(String),

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Convenience type alias for results using [`StrakeError`].
pub type Result<T> = std::result::Result<T, StrakeError>;
