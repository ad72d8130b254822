use nalgebra::Vector2;

use crate::disc::basis::ModalBasis;
use crate::disc::mesh::mesh2d::Element2d;
use crate::error::{LimiterError, LimiterResult};

const NEWTON_TOL: f64 = 1e-13;
const NEWTON_MAX_ITER: usize = 20;

/// Inverse of the reference-to-physical map of element `ielem` with nodal
/// coordinates `x`, `y`. Exact for affine maps, Newton iteration otherwise.
pub fn transform_real_to_unit_cell<T: Element2d>(
    ielem: usize,
    x: &[f64],
    y: &[f64],
    point: [f64; 2],
) -> LimiterResult<[f64; 2]> {
    let failed = || LimiterError::MappingFailed {
        ielem,
        x: point[0],
        y: point[1],
    };
    let scale = x
        .iter()
        .zip(y.iter())
        .map(|(xk, yk)| (xk - x[0]).abs().max((yk - y[0]).abs()))
        .fold(0.0_f64, f64::max);
    let target = Vector2::new(point[0], point[1]);
    let mut reference = Vector2::from(T::Basis::ref_centroid());
    for _ in 0..NEWTON_MAX_ITER {
        let mapped = Vector2::from(T::map_to_physical(reference[0], reference[1], x, y));
        let residual = target - mapped;
        if residual.norm() <= NEWTON_TOL * scale.max(1.0) {
            return Ok([reference[0], reference[1]]);
        }
        let jacob = T::evaluate_jacob(reference[0], reference[1], x, y);
        let jacob_inv = jacob.try_inverse().ok_or_else(failed)?;
        reference += jacob_inv * residual;
    }
    Err(failed())
}

/// Cell center nudged toward vertex `vertex` by the fraction `1 - fraction`.
pub fn nudge_toward_center(center: [f64; 2], vertex: [f64; 2], fraction: f64) -> [f64; 2] {
    [
        center[0] + (1.0 - fraction) * (vertex[0] - center[0]),
        center[1] + (1.0 - fraction) * (vertex[1] - center[1]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disc::mesh::mesh2d::{QuadrilateralElement, TriangleElement};
    use approx::assert_relative_eq;

    #[test]
    fn test_triangle_round_trip() {
        let x = [0.0, 2.0, 0.5];
        let y = [0.0, 0.2, 1.5];
        let p = TriangleElement::map_to_physical(-0.3, -0.4, &x, &y);
        let r = transform_real_to_unit_cell::<TriangleElement>(0, &x, &y, p).unwrap();
        assert_relative_eq!(r[0], -0.3, epsilon = 1e-12);
        assert_relative_eq!(r[1], -0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_bilinear_quad_round_trip() {
        // non-parallelogram
        let x = [0.0, 2.0, 2.5, -0.2];
        let y = [0.0, 0.1, 1.8, 1.0];
        for &(xi, eta) in &[(0.2, -0.7), (0.999, 0.999), (-1.0, 1.0)] {
            let p = QuadrilateralElement::map_to_physical(xi, eta, &x, &y);
            let r = transform_real_to_unit_cell::<QuadrilateralElement>(0, &x, &y, p).unwrap();
            assert_relative_eq!(r[0], xi, epsilon = 1e-10);
            assert_relative_eq!(r[1], eta, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_degenerate_cell_fails() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 1.0, 2.0];
        let result = transform_real_to_unit_cell::<TriangleElement>(7, &x, &y, [0.5, 0.1]);
        assert!(matches!(
            result,
            Err(LimiterError::MappingFailed { ielem: 7, .. })
        ));
    }

    #[test]
    fn test_nudged_point_is_interior() {
        let p = nudge_toward_center([0.5, 0.5], [1.0, 1.0], 1e-12);
        assert!(p[0] < 1.0 && p[1] < 1.0);
        assert_relative_eq!(p[0], 1.0, epsilon = 1e-11);
    }
}
