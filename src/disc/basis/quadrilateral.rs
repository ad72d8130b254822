use super::{MODE_NUM, ModalBasis};

/// Degree-1 modal basis on the reference square [-1, 1]^2.
pub struct QuadrilateralBasis;

impl ModalBasis for QuadrilateralBasis {
    fn ref_centroid() -> [f64; 2] {
        [0.0, 0.0]
    }
    fn evaluate_modes(xi: f64, eta: f64) -> [f64; MODE_NUM] {
        [1.0, xi, eta]
    }
    fn quadrature() -> Vec<(f64, f64, f64)> {
        let p = 1.0 / 3.0_f64.sqrt();
        vec![(-p, -p, 1.0), (p, -p, 1.0), (p, p, 1.0), (-p, p, 1.0)]
    }
}
