use std::ops::Range;

use ndarray::ArrayView1;

use crate::disc::basis::MODE_NUM;
use crate::disc::equations::Equations;
use crate::error::{LimiterError, LimiterResult};

/// Orthonormal frame of the non-primitive vector-field shape functions.
/// No direction is axis aligned, so every such shape function is non-zero
/// in more than one component.
const VECTOR_FRAME: [[f64; 3]; 3] = [
    [
        0.577_350_269_189_625_8,
        0.577_350_269_189_625_8,
        0.577_350_269_189_625_8,
    ],
    [0.707_106_781_186_547_6, -0.707_106_781_186_547_6, 0.0],
    [
        0.408_248_290_463_863,
        0.408_248_290_463_863,
        -0.816_496_580_927_726,
    ],
];

#[derive(Clone, Debug, PartialEq)]
pub enum ShapeKind {
    /// Non-zero in exactly one component.
    Primitive { component: usize },
    /// Mode times a fixed direction over the block starting at
    /// `first_component`.
    NonPrimitive {
        first_component: usize,
        direction: [f64; 3],
    },
}
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeFunction {
    pub kind: ShapeKind,
    pub mode: usize,
}
impl ShapeFunction {
    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, ShapeKind::Primitive { .. })
    }
    /// Component used to group DOFs into blocks.
    pub fn system_component(&self) -> usize {
        match self.kind {
            ShapeKind::Primitive { component } => component,
            ShapeKind::NonPrimitive {
                first_component, ..
            } => first_component,
        }
    }
    fn component_weight(&self, component: usize) -> f64 {
        match self.kind {
            ShapeKind::Primitive { component: c } => {
                if c == component {
                    1.0
                } else {
                    0.0
                }
            }
            ShapeKind::NonPrimitive {
                first_component,
                direction,
            } => {
                if (first_component..first_component + 3).contains(&component) {
                    direction[component - first_component]
                } else {
                    0.0
                }
            }
        }
    }
}
#[derive(Clone, Debug)]
pub struct FiniteElement {
    pub shape_functions: Vec<ShapeFunction>,
    pub component_num: usize,
    pub vector_field: Option<Range<usize>>,
    /// Per component, the (local DOF, weight) pairs whose weighted sum is
    /// the cell mean of that component.
    pub cell_mean_map: Vec<Vec<(usize, f64)>>,
}
impl FiniteElement {
    /// Degree-1 DG system for `equations`, ordered mode-major. With
    /// `div_conforming_vector_field` the field components are carried by
    /// non-primitive shape functions.
    pub fn dg_system(equations: Equations, div_conforming_vector_field: bool) -> LimiterResult<Self> {
        let component_num = equations.component_num();
        let vector_field = equations.vector_field();
        let non_primitive_field = match (&vector_field, div_conforming_vector_field) {
            (Some(field), true) => Some(field.clone()),
            (None, true) => {
                return Err(LimiterError::InvalidConfig(format!(
                    "{equations:?} has no vector field to discretize non-primitively"
                )));
            }
            (_, false) => None,
        };
        let mut shape_functions = Vec::new();
        for mode in 0..MODE_NUM {
            for component in 0..component_num {
                if non_primitive_field
                    .as_ref()
                    .is_some_and(|f| f.contains(&component))
                {
                    continue;
                }
                shape_functions.push(ShapeFunction {
                    kind: ShapeKind::Primitive { component },
                    mode,
                });
            }
            if let Some(field) = &non_primitive_field {
                for direction in VECTOR_FRAME {
                    shape_functions.push(ShapeFunction {
                        kind: ShapeKind::NonPrimitive {
                            first_component: field.start,
                            direction,
                        },
                        mode,
                    });
                }
            }
        }
        Self::from_shape_functions(shape_functions, component_num, vector_field)
    }
    /// Validates the layout and builds the cell-mean map. Every primitive
    /// component needs exactly one constant mode, and it must be the first
    /// shape function met for that component.
    pub fn from_shape_functions(
        shape_functions: Vec<ShapeFunction>,
        component_num: usize,
        vector_field: Option<Range<usize>>,
    ) -> LimiterResult<Self> {
        if component_num == 0 {
            return Err(LimiterError::InvalidLayout("no components".to_string()));
        }
        if let Some(field) = &vector_field {
            if field.end > component_num || field.len() != 3 {
                return Err(LimiterError::InvalidLayout(format!(
                    "vector field {field:?} does not fit {component_num} components"
                )));
            }
        }
        let mut seen_primitive = vec![false; component_num];
        let mut seen_non_primitive = vec![false; component_num];
        let mut cell_mean_map: Vec<Vec<(usize, f64)>> = vec![Vec::new(); component_num];
        for (i, sf) in shape_functions.iter().enumerate() {
            if sf.mode >= MODE_NUM {
                return Err(LimiterError::InvalidLayout(format!(
                    "shape function {i} uses mode {} of {MODE_NUM}",
                    sf.mode
                )));
            }
            match sf.kind {
                ShapeKind::Primitive { component } => {
                    if component >= component_num {
                        return Err(LimiterError::InvalidLayout(format!(
                            "shape function {i} belongs to component {component} of {component_num}"
                        )));
                    }
                    if !seen_primitive[component] && sf.mode != 0 {
                        return Err(LimiterError::InvalidLayout(format!(
                            "first shape function of component {component} is not the constant mode"
                        )));
                    }
                    if seen_primitive[component] && sf.mode == 0 {
                        return Err(LimiterError::InvalidLayout(format!(
                            "component {component} has more than one constant mode"
                        )));
                    }
                    seen_primitive[component] = true;
                    if sf.mode == 0 {
                        cell_mean_map[component].push((i, 1.0));
                    }
                }
                ShapeKind::NonPrimitive {
                    first_component, ..
                } => {
                    if first_component + 3 > component_num {
                        return Err(LimiterError::InvalidLayout(format!(
                            "shape function {i} spans components beyond {component_num}"
                        )));
                    }
                    for component in first_component..first_component + 3 {
                        seen_non_primitive[component] = true;
                        let weight = sf.component_weight(component);
                        if sf.mode == 0 && weight != 0.0 {
                            cell_mean_map[component].push((i, weight));
                        }
                    }
                }
            }
        }
        for component in 0..component_num {
            if seen_primitive[component] && seen_non_primitive[component] {
                return Err(LimiterError::InvalidLayout(format!(
                    "component {component} mixes primitive and non-primitive shape functions"
                )));
            }
            if cell_mean_map[component].is_empty() {
                return Err(LimiterError::InvalidLayout(format!(
                    "component {component} has no constant mode"
                )));
            }
        }
        Ok(Self {
            shape_functions,
            component_num,
            vector_field,
            cell_mean_map,
        })
    }
    pub fn dofs_per_cell(&self) -> usize {
        self.shape_functions.len()
    }
    /// Cell means of all components of the cell with global DOFs `dof_indices`.
    pub fn cell_means(&self, dof_indices: &[usize], solution: ArrayView1<f64>, out: &mut [f64]) {
        for (component, pairs) in self.cell_mean_map.iter().enumerate() {
            out[component] = pairs
                .iter()
                .map(|&(i, w)| w * solution[dof_indices[i]])
                .sum();
        }
    }
    /// Field values at a point where the modal basis evaluates to `modes`.
    pub fn point_values(
        &self,
        modes: &[f64; MODE_NUM],
        dof_indices: &[usize],
        solution: ArrayView1<f64>,
        out: &mut [f64],
    ) {
        out.fill(0.0);
        for (i, sf) in self.shape_functions.iter().enumerate() {
            let value = solution[dof_indices[i]] * modes[sf.mode];
            match sf.kind {
                ShapeKind::Primitive { component } => out[component] += value,
                ShapeKind::NonPrimitive {
                    first_component,
                    direction,
                } => {
                    for (d, dir) in direction.iter().enumerate() {
                        out[first_component + d] += value * dir;
                    }
                }
            }
        }
    }
    /// Local DOF values representing per-component modal coefficients
    /// `coefficients[component][mode]`.
    pub fn dof_values_from_modal(&self, coefficients: &[[f64; MODE_NUM]]) -> Vec<f64> {
        self.shape_functions
            .iter()
            .map(|sf| match sf.kind {
                ShapeKind::Primitive { component } => coefficients[component][sf.mode],
                ShapeKind::NonPrimitive {
                    first_component,
                    direction,
                } => direction
                    .iter()
                    .enumerate()
                    .map(|(d, dir)| dir * coefficients[first_component + d][sf.mode])
                    .sum(),
            })
            .collect()
    }
}
