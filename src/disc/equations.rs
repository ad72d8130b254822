use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Equation systems the limiter is configured for. The mesh is 2-D, so
/// Euler carries two momentum components while MHD keeps all three
/// momentum and field components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Equations {
    Euler,
    Mhd,
}
impl Equations {
    pub fn component_num(&self) -> usize {
        self.component_names().len()
    }
    pub fn component_names(&self) -> &'static [&'static str] {
        match self {
            Equations::Euler => &["density", "momentum_x", "momentum_y", "energy"],
            Equations::Mhd => &[
                "density",
                "momentum_x",
                "momentum_y",
                "momentum_z",
                "energy",
                "magnetic_x",
                "magnetic_y",
                "magnetic_z",
            ],
        }
    }
    /// Components forming the magnetic field, limited jointly.
    pub fn vector_field(&self) -> Option<Range<usize>> {
        match self {
            Equations::Euler => None,
            Equations::Mhd => Some(5..8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_layout() {
        assert_eq!(Equations::Euler.component_num(), 4);
        assert_eq!(Equations::Mhd.component_num(), 8);
        assert_eq!(Equations::Euler.vector_field(), None);
        let field = Equations::Mhd.vector_field().unwrap();
        assert_eq!(Equations::Mhd.component_names()[field.start], "magnetic_x");
        assert_eq!(field.len(), 3);
    }

    #[test]
    fn test_parse_from_json() {
        let e: Equations = serde_json::from_str("\"mhd\"").unwrap();
        assert_eq!(e, Equations::Mhd);
    }
}
