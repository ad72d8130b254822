use nalgebra::{Matrix3, Vector3};
use ndarray::Array1;

use crate::disc::basis::{MODE_NUM, ModalBasis};
use crate::disc::dof_handler::DofHandler;
use crate::disc::equations::Equations;
use crate::disc::finite_element::FiniteElement;
use crate::disc::mesh::mesh2d::{Element2d, Mesh2d, QuadrilateralElement, TriangleElement};
use crate::error::{LimiterError, LimiterResult};
use crate::io::param_parser::RunParameters;

const HCR: f64 = 5.0 / 3.0;

pub fn initialize_params_by_file(file_path: &str) -> LimiterResult<RunParameters> {
    RunParameters::parse(file_path)
}
pub fn initialize_quad_mesh(params: &RunParameters) -> Mesh2d<QuadrilateralElement> {
    let mut mesh = Mesh2d::create_quad_mesh(
        params.x_num,
        params.y_num,
        params.lower_left[0],
        params.upper_right[0],
        params.lower_left[1],
        params.upper_right[1],
    );
    mesh.partition(params.n_ranks);
    mesh
}
pub fn initialize_tri_mesh(params: &RunParameters) -> Mesh2d<TriangleElement> {
    let mut mesh = Mesh2d::create_tri_mesh(
        params.x_num,
        params.y_num,
        params.lower_left[0],
        params.upper_right[0],
        params.lower_left[1],
        params.upper_right[1],
    );
    mesh.partition(params.n_ranks);
    mesh
}
pub fn initialize_finite_element(params: &RunParameters) -> LimiterResult<FiniteElement> {
    FiniteElement::dg_system(params.equations, params.div_conforming_vector_field)
}

/// Conserved state of a blast wave centered at `center`: high pressure
/// inside `radius`, low outside, fluid at rest. MHD adds a uniform oblique
/// magnetic field.
pub fn blast_state(equations: Equations, center: [f64; 2], radius: f64, x: f64, y: f64) -> Vec<f64> {
    let inside = (x - center[0]).powi(2) + (y - center[1]).powi(2) < radius * radius;
    let density = 1.0;
    let pressure = if inside { 10.0 } else { 0.1 };
    match equations {
        Equations::Euler => vec![density, 0.0, 0.0, pressure / (HCR - 1.0)],
        Equations::Mhd => {
            let b = [0.75, 1.0, 0.0];
            let magnetic_energy = 0.5 * (b[0] * b[0] + b[1] * b[1] + b[2] * b[2]);
            vec![
                density,
                0.0,
                0.0,
                0.0,
                pressure / (HCR - 1.0) + magnetic_energy,
                b[0],
                b[1],
                b[2],
            ]
        }
    }
}

/// L2 projection of `state` onto the modal basis of every cell.
pub fn project_initial_condition<T, F>(
    mesh: &Mesh2d<T>,
    dofs: &DofHandler,
    fe: &FiniteElement,
    state: F,
) -> LimiterResult<Array1<f64>>
where
    T: Element2d,
    F: Fn(f64, f64) -> Vec<f64>,
{
    let quadrature = T::Basis::quadrature();
    let mut mass = Matrix3::zeros();
    for &(xi, eta, w) in &quadrature {
        let phi = Vector3::from(T::Basis::evaluate_modes(xi, eta));
        mass += w * phi * phi.transpose();
    }
    let mass_inv = mass
        .try_inverse()
        .ok_or_else(|| LimiterError::InvalidLayout("singular modal mass matrix".to_string()))?;

    let mut solution = Array1::zeros(dofs.n_dofs());
    let mut rhs = vec![Vector3::zeros(); fe.component_num];
    for ielem in 0..mesh.elem_num {
        let (x, y) = mesh.element_coords(ielem);
        rhs.iter_mut().for_each(|r| *r = Vector3::zeros());
        for &(xi, eta, w) in &quadrature {
            let [px, py] = T::map_to_physical(xi, eta, &x, &y);
            let values = state(px, py);
            if values.len() != fe.component_num {
                return Err(LimiterError::dimension_mismatch(
                    "initial state",
                    fe.component_num,
                    values.len(),
                ));
            }
            let phi = Vector3::from(T::Basis::evaluate_modes(xi, eta));
            for (r, value) in rhs.iter_mut().zip(values) {
                *r += w * value * phi;
            }
        }
        let coefficients: Vec<[f64; MODE_NUM]> = rhs
            .iter()
            .map(|r| {
                let c = mass_inv * r;
                [c[0], c[1], c[2]]
            })
            .collect();
        let local = fe.dof_values_from_modal(&coefficients);
        for (&dof, value) in dofs.cell_dof_indices(ielem).iter().zip(local) {
            solution[dof] = value;
        }
    }
    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_field_is_reproduced() {
        let mesh = Mesh2d::create_tri_mesh(2, 2, 0.0, 1.0, 0.0, 1.0);
        let fe = FiniteElement::dg_system(Equations::Mhd, true).unwrap();
        let dofs = DofHandler::distribute(&mesh, &fe);
        let linear = |x: f64, y: f64| (0..8).map(|c| 1.0 + c as f64 * x - 0.5 * y).collect();
        let solution = project_initial_condition(&mesh, &dofs, &fe, linear).unwrap();

        let mut values = vec![0.0; 8];
        for ielem in 0..mesh.elem_num {
            let (x, y) = mesh.element_coords(ielem);
            let dof_indices = dofs.cell_dof_indices(ielem);
            for &(xi, eta) in &[(-1.0, -1.0), (0.2, -0.6), (-0.5, 0.3)] {
                let [px, py] = TriangleElement::map_to_physical(xi, eta, &x, &y);
                let modes = <TriangleElement as Element2d>::Basis::evaluate_modes(xi, eta);
                fe.point_values(&modes, dof_indices, solution.view(), &mut values);
                for c in 0..8 {
                    assert_relative_eq!(values[c], 1.0 + c as f64 * px - 0.5 * py, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_cell_mean_of_projection() {
        let mesh = Mesh2d::create_quad_mesh(2, 2, 0.0, 2.0, 0.0, 2.0);
        let fe = FiniteElement::dg_system(Equations::Euler, false).unwrap();
        let dofs = DofHandler::distribute(&mesh, &fe);
        let solution = project_initial_condition(&mesh, &dofs, &fe, |x, y| {
            blast_state(Equations::Euler, [1.0, 1.0], 10.0, x, y)
        })
        .unwrap();
        let mut means = vec![0.0; 4];
        fe.cell_means(dofs.cell_dof_indices(3), solution.view(), &mut means);
        assert_relative_eq!(means[0], 1.0, epsilon = 1e-14);
        assert_relative_eq!(means[3], 15.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wrong_state_length() {
        let mesh = Mesh2d::create_quad_mesh(1, 1, 0.0, 1.0, 0.0, 1.0);
        let fe = FiniteElement::dg_system(Equations::Mhd, false).unwrap();
        let dofs = DofHandler::distribute(&mesh, &fe);
        let result = project_initial_condition(&mesh, &dofs, &fe, |x, y| {
            blast_state(Equations::Euler, [0.0, 0.0], 0.1, x, y)
        });
        assert!(matches!(result, Err(LimiterError::DimensionMismatch { .. })));
    }
}
