use super::{MODE_NUM, ModalBasis};

/// Degree-1 modal basis on the reference triangle (-1,-1), (1,-1), (-1,1).
/// The linear modes are the collapsed-coordinate Dubiner modes of order one,
/// scaled so that they vanish at the centroid.
pub struct TriangleBasis;

impl ModalBasis for TriangleBasis {
    fn ref_centroid() -> [f64; 2] {
        [-1.0 / 3.0, -1.0 / 3.0]
    }
    fn evaluate_modes(xi: f64, eta: f64) -> [f64; MODE_NUM] {
        [1.0, xi + 0.5 * (1.0 + eta), 0.5 * (3.0 * eta + 1.0)]
    }
    fn quadrature() -> Vec<(f64, f64, f64)> {
        // edge midpoints, area 2
        let w = 2.0 / 3.0;
        vec![(0.0, -1.0, w), (0.0, 0.0, w), (-1.0, 0.0, w)]
    }
}
