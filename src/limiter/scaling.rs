use std::ops::Range;

use ndarray::ArrayViewMut1;

use super::cache::CellTopologyRecord;

/// How the factors of the vector-field components reach its DOFs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VectorFieldScaling {
    /// Field DOFs are left as they are.
    Unlimited,
    /// Every field DOF is scaled by the smallest field factor.
    Joint,
    /// Primitive field DOFs use their own component's factor; the
    /// non-primitive ones the smallest field factor.
    ComponentWise,
}

/// Smallest factor over the components of `field`.
pub fn joint_factor(alpha: &[f64], field: &Range<usize>) -> f64 {
    alpha[field.clone()].iter().copied().fold(f64::INFINITY, f64::min)
}

/// Multiplies the non-constant DOFs of one cell in `limited` by the
/// factors `alpha`. Constant-mode DOFs are never touched.
pub fn apply_scaling(
    limited: &mut ArrayViewMut1<f64>,
    record: &CellTopologyRecord,
    alpha: &[f64],
    vector_field: Option<&Range<usize>>,
    mode: VectorFieldScaling,
) {
    let joint = vector_field.map(|field| joint_factor(alpha, field));
    for (component, indices) in record.lambda_indices_to_multiply.iter().enumerate() {
        let in_field = vector_field.is_some_and(|field| field.contains(&component));
        let factor = match (in_field, mode, joint) {
            (true, VectorFieldScaling::Unlimited, _) => continue,
            (true, VectorFieldScaling::Joint, Some(joint)) => joint,
            _ => alpha[component],
        };
        for &i in indices {
            limited[i] *= factor;
        }
    }
    if let (Some(joint), false) = (joint, mode == VectorFieldScaling::Unlimited) {
        for &i in &record.lambda_indices_to_multiply_all_b_components {
            limited[i] *= joint;
        }
    }
}

/// Rewrites `alpha` to the factor `apply_scaling` used on each component's
/// DOFs under `mode`. Field components without primitive DOFs were scaled
/// by the joint factor.
pub fn applied_factors(
    alpha: &mut [f64],
    record: &CellTopologyRecord,
    vector_field: Option<&Range<usize>>,
    mode: VectorFieldScaling,
) {
    let Some(field) = vector_field else {
        return;
    };
    let joint = joint_factor(alpha, field);
    for component in field.clone() {
        let has_primitive_dofs = !record.lambda_indices_to_multiply[component].is_empty();
        alpha[component] = match mode {
            VectorFieldScaling::Unlimited => 1.0,
            VectorFieldScaling::Joint => joint,
            VectorFieldScaling::ComponentWise if has_primitive_dofs => alpha[component],
            VectorFieldScaling::ComponentWise => joint,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limiter::bounds::ComponentBounds;
    use crate::limiter::factor::tighten_factors;
    use approx::assert_relative_eq;
    use ndarray::Array1;
    use smallvec::smallvec;

    fn record(lambda: Vec<Vec<usize>>, all_b: Vec<usize>) -> CellTopologyRecord {
        CellTopologyRecord {
            center: [0.0, 0.0],
            vertex_point: smallvec![],
            vertex_modes: smallvec![],
            vertex_is_at_nonperiodic_boundary: smallvec![],
            lambda_indices_to_multiply: lambda,
            lambda_indices_to_multiply_all_b_components: all_b,
            neighbor_dof_indices: vec![],
            neighbor_count: 0,
        }
    }

    #[test]
    fn test_half_factor_scales_slope_only() {
        // u_c = 2, u_i = 3 against the range [1, 2.5]
        let bounds = ComponentBounds {
            min: smallvec![1.0],
            max: smallvec![2.5],
        };
        let mut alpha = [1.0];
        tighten_factors(&mut alpha, &[2.0], &[3.0], &bounds);
        assert_relative_eq!(alpha[0], 0.5);

        let r = record(vec![vec![1]], vec![]);
        let mut values = Array1::from(vec![2.0, 0.8]);
        apply_scaling(&mut values.view_mut(), &r, &alpha, None, VectorFieldScaling::Unlimited);
        assert_eq!(values[0], 2.0);
        assert_relative_eq!(values[1], 0.4);
    }

    #[test]
    fn test_joint_factor_is_field_minimum() {
        let alpha = [0.1, 1.0, 0.7, 0.4, 0.9];
        assert_relative_eq!(joint_factor(&alpha, &(2..5)), 0.4);
    }

    #[test]
    fn test_component_wise_without_field() {
        let r = record(vec![vec![0], vec![1, 2]], vec![]);
        let mut values = Array1::from(vec![2.0, 2.0, 4.0, 9.0]);
        apply_scaling(&mut values.view_mut(), &r, &[0.5, 0.25], None, VectorFieldScaling::Joint);
        assert_eq!(values.to_vec(), vec![1.0, 0.5, 1.0, 9.0]);
    }

    #[test]
    fn test_field_scaling_modes() {
        // components 0, 1 primitive field components, 2 outside; 3 non-primitive
        let r = record(vec![vec![0], vec![1], vec![2]], vec![3]);
        let alpha = [0.5, 0.8, 0.9];
        let field = 0..2;
        let start = Array1::from(vec![1.0, 1.0, 1.0, 1.0]);

        let mut values = start.clone();
        apply_scaling(&mut values.view_mut(), &r, &alpha, Some(&field), VectorFieldScaling::Unlimited);
        assert_eq!(values.to_vec(), vec![1.0, 1.0, 0.9, 1.0]);

        let mut values = start.clone();
        apply_scaling(&mut values.view_mut(), &r, &alpha, Some(&field), VectorFieldScaling::Joint);
        assert_eq!(values.to_vec(), vec![0.5, 0.5, 0.9, 0.5]);

        let mut values = start;
        apply_scaling(&mut values.view_mut(), &r, &alpha, Some(&field), VectorFieldScaling::ComponentWise);
        assert_eq!(values.to_vec(), vec![0.5, 0.8, 0.9, 0.5]);
    }

    #[test]
    fn test_applied_factors_follow_scaling_mode() {
        // components 0..3 form the field; 3 has only non-primitive DOFs
        let r = record(vec![vec![0], vec![1], vec![2], vec![], vec![4]], vec![5]);
        let alpha = [0.5, 0.8, 0.9, 0.7, 0.6];
        let field = 1..4;

        let mut applied = alpha;
        applied_factors(&mut applied, &r, Some(&field), VectorFieldScaling::Unlimited);
        assert_eq!(applied, [0.5, 1.0, 1.0, 1.0, 0.6]);

        let mut applied = alpha;
        applied_factors(&mut applied, &r, Some(&field), VectorFieldScaling::Joint);
        assert_eq!(applied, [0.5, 0.7, 0.7, 0.7, 0.6]);

        let mut applied = alpha;
        applied_factors(&mut applied, &r, Some(&field), VectorFieldScaling::ComponentWise);
        assert_eq!(applied, [0.5, 0.8, 0.9, 0.7, 0.6]);

        let mut applied = alpha;
        applied_factors(&mut applied, &r, None, VectorFieldScaling::Unlimited);
        assert_eq!(applied, alpha);
    }
}
