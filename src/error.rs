use thiserror::Error;

#[derive(Error, Debug)]
pub enum LimiterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid finite element layout: {0}")]
    InvalidLayout(String),

    #[error("Failed to map point ({x}, {y}) into the reference cell of element {ielem}")]
    MappingFailed { ielem: usize, x: f64, y: f64 },

    #[error("DOF handler was distributed for mesh generation {dof_generation}, mesh is at {mesh_generation}")]
    OutdatedDofHandler {
        dof_generation: u64,
        mesh_generation: u64,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LimiterError {
    pub fn dimension_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }
}

pub type LimiterResult<T> = Result<T, LimiterError>;
