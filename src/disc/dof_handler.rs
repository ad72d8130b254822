use std::collections::BTreeSet;

use ndarray::{Array1, ArrayView1};

use crate::disc::finite_element::FiniteElement;
use crate::disc::mesh::next_generation;
use crate::disc::mesh::mesh2d::{Element2d, Mesh2d};

/// Identifies one mesh topology plus one DOF numbering. Anything cached
/// against DOF indices is valid only for the generation it was built with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TopologyGeneration {
    pub mesh: u64,
    pub dofs: u64,
}
#[derive(Clone, Debug)]
pub struct DofHandler {
    pub dofs_per_cell: usize,
    pub elem_num: usize,
    cell_dofs: Vec<usize>,
    generation: TopologyGeneration,
}
impl DofHandler {
    /// Cell-major numbering: cell `k` owns `k * dofs_per_cell ..`.
    pub fn distribute<T: Element2d>(mesh: &Mesh2d<T>, fe: &FiniteElement) -> Self {
        let dofs_per_cell = fe.dofs_per_cell();
        Self {
            dofs_per_cell,
            elem_num: mesh.elem_num,
            cell_dofs: (0..mesh.elem_num * dofs_per_cell).collect(),
            generation: TopologyGeneration {
                mesh: mesh.generation,
                dofs: next_generation(),
            },
        }
    }
    pub fn n_dofs(&self) -> usize {
        self.cell_dofs.len()
    }
    pub fn cell_dof_indices(&self, ielem: usize) -> &[usize] {
        &self.cell_dofs[ielem * self.dofs_per_cell..(ielem + 1) * self.dofs_per_cell]
    }
    pub fn generation(&self) -> TopologyGeneration {
        self.generation
    }
    /// Groups DOFs into one block per system component, cells in order
    /// inside each block. Returns the old-to-new index map.
    pub fn renumber_component_wise(&mut self, fe: &FiniteElement) -> Vec<usize> {
        let blocks: BTreeSet<usize> = fe
            .shape_functions
            .iter()
            .map(|sf| sf.system_component())
            .collect();
        let mut old_to_new = vec![0; self.n_dofs()];
        let mut counter = 0;
        for block in blocks {
            for ielem in 0..self.elem_num {
                for (i, sf) in fe.shape_functions.iter().enumerate() {
                    if sf.system_component() == block {
                        old_to_new[self.cell_dofs[ielem * self.dofs_per_cell + i]] = counter;
                        counter += 1;
                    }
                }
            }
        }
        for dof in self.cell_dofs.iter_mut() {
            *dof = old_to_new[*dof];
        }
        self.generation.dofs = next_generation();
        old_to_new
    }
}
/// Moves the entries of `vector` to their renumbered positions.
pub fn permute_vector(vector: ArrayView1<f64>, old_to_new: &[usize]) -> Array1<f64> {
    let mut permuted = Array1::zeros(vector.len());
    for (old, &new) in old_to_new.iter().enumerate() {
        permuted[new] = vector[old];
    }
    permuted
}
