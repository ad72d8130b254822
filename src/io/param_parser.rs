use std::fs;

use serde::{Deserialize, Serialize};

use crate::disc::equations::Equations;
use crate::disc::mesh::PeriodicPair;
use crate::error::{LimiterError, LimiterResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlopeLimiterKind {
    #[default]
    VertexBased,
    BarthJespersen,
}
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LimiterParameters {
    /// Master switch.
    pub limit: bool,
    /// Also limit the magnetic field, with a single factor for all of it.
    #[serde(alias = "limitB")]
    pub limit_b: bool,
    /// When off, boundary vertices of cells with few neighbors are not
    /// checked by the vertex-based limiter.
    pub limit_edges_and_vertices: bool,
    pub slope_limiter: SlopeLimiterKind,
    pub start_limiting_at: f64,
    pub periodic_boundaries: Vec<PeriodicPair>,
    pub sparse_vertex_neighbor_threshold: usize,
}
impl Default for LimiterParameters {
    fn default() -> Self {
        Self {
            limit: true,
            limit_b: false,
            limit_edges_and_vertices: true,
            slope_limiter: SlopeLimiterKind::VertexBased,
            start_limiting_at: 0.0,
            periodic_boundaries: Vec::new(),
            sparse_vertex_neighbor_threshold: 4,
        }
    }
}
impl LimiterParameters {
    pub fn validate(&self) -> LimiterResult<()> {
        if !self.start_limiting_at.is_finite() {
            return Err(LimiterError::InvalidConfig(format!(
                "start_limiting_at must be finite, got {}",
                self.start_limiting_at
            )));
        }
        for pair in &self.periodic_boundaries {
            if pair.0 == pair.1 {
                return Err(LimiterError::InvalidConfig(format!(
                    "periodic pair {pair:?} glues a boundary to itself"
                )));
            }
            if pair.2 > 1 {
                return Err(LimiterError::InvalidConfig(format!(
                    "periodic pair {pair:?} has direction {} on a 2-D mesh",
                    pair.2
                )));
            }
        }
        Ok(())
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Triangle,
    Quadrilateral,
}
/// Parameters of the driver binary.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RunParameters {
    pub equations: Equations,
    #[serde(default)]
    pub div_conforming_vector_field: bool,
    pub element: ElementKind,
    pub x_num: usize,
    pub y_num: usize,
    pub lower_left: [f64; 2],
    pub upper_right: [f64; 2],
    #[serde(default = "default_n_ranks")]
    pub n_ranks: usize,
    #[serde(default)]
    pub refinements: usize,
    pub time_step: f64,
    pub final_time: f64,
    #[serde(default)]
    pub factors_csv: Option<String>,
    #[serde(default)]
    pub limiter: LimiterParameters,
}
fn default_n_ranks() -> usize {
    1
}
impl RunParameters {
    pub fn parse(file_path: &str) -> LimiterResult<Self> {
        let file_content = fs::read_to_string(file_path)?;
        Self::from_json(&file_content)
    }
    pub fn from_json(content: &str) -> LimiterResult<Self> {
        let params: RunParameters = serde_json::from_str(content)?;
        params.validate()?;
        Ok(params)
    }
    pub fn validate(&self) -> LimiterResult<()> {
        if self.x_num == 0 || self.y_num == 0 {
            return Err(LimiterError::InvalidConfig(format!(
                "mesh needs at least one cell per direction, got {} x {}",
                self.x_num, self.y_num
            )));
        }
        if self.upper_right[0] <= self.lower_left[0] || self.upper_right[1] <= self.lower_left[1] {
            return Err(LimiterError::InvalidConfig(format!(
                "empty domain {:?} to {:?}",
                self.lower_left, self.upper_right
            )));
        }
        if self.time_step.is_nan() || self.time_step <= 0.0 {
            return Err(LimiterError::InvalidConfig(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if self.n_ranks == 0 {
            return Err(LimiterError::InvalidConfig("n_ranks must be positive".to_string()));
        }
        self.limiter.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disc::mesh::is_periodic_boundary;

    const RUN: &str = r#"{
        "equations": "mhd",
        "div_conforming_vector_field": true,
        "element": "triangle",
        "x_num": 8,
        "y_num": 4,
        "lower_left": [0.0, 0.0],
        "upper_right": [2.0, 1.0],
        "time_step": 0.1,
        "final_time": 1.0,
        "limiter": {
            "limitB": true,
            "slope_limiter": "barth_jespersen",
            "periodic_boundaries": [[0, 1, 0]]
        }
    }"#;

    #[test]
    fn test_limiter_defaults() {
        let params: LimiterParameters = serde_json::from_str("{}").unwrap();
        assert_eq!(params, LimiterParameters::default());
        assert!(params.limit);
        assert!(!params.limit_b);
        assert!(params.limit_edges_and_vertices);
        assert_eq!(params.sparse_vertex_neighbor_threshold, 4);
        assert_eq!(params.slope_limiter, SlopeLimiterKind::VertexBased);
    }

    #[test]
    fn test_run_parameters() {
        let params = RunParameters::from_json(RUN).unwrap();
        assert_eq!(params.equations, Equations::Mhd);
        assert_eq!(params.element, ElementKind::Triangle);
        assert_eq!(params.n_ranks, 1);
        assert_eq!(params.refinements, 0);
        assert_eq!(params.factors_csv, None);
        assert!(params.limiter.limit_b);
        assert_eq!(params.limiter.slope_limiter, SlopeLimiterKind::BarthJespersen);
        assert!(is_periodic_boundary(&params.limiter.periodic_boundaries, 0));
        assert!(is_periodic_boundary(&params.limiter.periodic_boundaries, 1));
        assert!(!is_periodic_boundary(&params.limiter.periodic_boundaries, 2));
    }

    #[test]
    fn test_invalid_periodic_pair() {
        let json = RUN.replace("[[0, 1, 0]]", "[[2, 2, 1]]");
        assert!(matches!(
            RunParameters::from_json(&json),
            Err(LimiterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            RunParameters::from_json("{\"equations\": 3}"),
            Err(LimiterError::Json(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            RunParameters::parse("does/not/exist.json"),
            Err(LimiterError::Io(_))
        ));
    }
}
