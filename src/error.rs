//! Error kinds surfaced by the routing core.
//!
//! Every fallible operation in `geo`, `cost`, `graph`, `pathfinder`,
//! `routing`, `cache`, and `planner` returns `Result<_, PlannerError>`.
//! The gRPC layer is the only place these get mapped to wire status codes.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum PlannerError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("port not found: {0}")]
    PortNotFound(String),

    #[error("vessel constraint violation: {0}")]
    VesselConstraint(String),

    #[error("no route found between {origin} and {destination}")]
    NoRoute { origin: String, destination: String },

    #[error("route calculation timed out after {0}s")]
    CalculationTimeout(u64),

    #[error("upstream service failure: {0}")]
    UpstreamFailure(String),
}

impl PlannerError {
    /// Stable error code for logging and wire responses.
    pub fn code(&self) -> &'static str {
        match self {
            PlannerError::Validation(_) => "VALIDATION_ERROR",
            PlannerError::PortNotFound(_) => "PORT_NOT_FOUND",
            PlannerError::VesselConstraint(_) => "VESSEL_CONSTRAINT_ERROR",
            PlannerError::NoRoute { .. } => "NO_ROUTE",
            PlannerError::CalculationTimeout(_) => "CALCULATION_TIMEOUT",
            PlannerError::UpstreamFailure(_) => "UPSTREAM_FAILURE",
        }
    }
}

pub type PlannerResult<T> = Result<T, PlannerError>;
