//! Error taxonomy for the collision core.

use thiserror::Error;

/// Iterative stage that failed to converge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Gjk,
    Epa,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Gjk => f.write_str("GJK"),
            Stage::Epa => f.write_str("EPA"),
        }
    }
}

/// Errors produced while configuring bodies or resolving a single pair.
///
/// `NonConvergence` and `DegenerateGeometry` are scoped to one collider pair:
/// the world logs them, skips the pair, and keeps stepping.
/// `InvalidBodyState` is returned when a body is configured.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    #[error("{stage} did not converge within {iterations} iterations")]
    NonConvergence { stage: Stage, iterations: usize },

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(&'static str),

    #[error("invalid body state: {0}")]
    InvalidBodyState(String),
}

pub type Result<T> = std::result::Result<T, PhysicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PhysicsError::NonConvergence {
            stage: Stage::Epa,
            iterations: 64,
        };
        assert_eq!(err.to_string(), "EPA did not converge within 64 iterations");

        let err = PhysicsError::DegenerateGeometry("empty vertex set");
        assert_eq!(err.to_string(), "degenerate geometry: empty vertex set");
    }
}
