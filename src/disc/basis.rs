pub mod quadrilateral;
pub mod triangle;

/// Number of modes of the degree-1 modal basis on either reference shape.
pub const MODE_NUM: usize = 3;

/// Modal basis whose first mode is the constant 1 and whose remaining
/// modes have zero mean over the reference element. The coefficient of
/// mode 0 is therefore the cell mean of the expanded field.
pub trait ModalBasis {
    /// Reference centroid; every non-constant mode vanishes there.
    fn ref_centroid() -> [f64; 2];
    fn evaluate_modes(xi: f64, eta: f64) -> [f64; MODE_NUM];
    /// Quadrature rule exact for quadratics, as (xi, eta, weight).
    fn quadrature() -> Vec<(f64, f64, f64)>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn check_zero_mean<B: ModalBasis>() {
        let quadrature = B::quadrature();
        let area: f64 = quadrature.iter().map(|&(_, _, w)| w).sum();
        for imode in 0..MODE_NUM {
            let integral: f64 = quadrature
                .iter()
                .map(|&(xi, eta, w)| w * B::evaluate_modes(xi, eta)[imode])
                .sum();
            let expected = if imode == 0 { area } else { 0.0 };
            assert_relative_eq!(integral, expected, epsilon = 1e-14);
        }
        let [xc, yc] = B::ref_centroid();
        let at_centroid = B::evaluate_modes(xc, yc);
        assert_relative_eq!(at_centroid[0], 1.0);
        assert_relative_eq!(at_centroid[1], 0.0, epsilon = 1e-15);
        assert_relative_eq!(at_centroid[2], 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_triangle_modes_have_zero_mean() {
        check_zero_mean::<triangle::TriangleBasis>();
    }

    #[test]
    fn test_quadrilateral_modes_have_zero_mean() {
        check_zero_mean::<quadrilateral::QuadrilateralBasis>();
    }
}
