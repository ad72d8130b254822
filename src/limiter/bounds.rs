use ndarray::ArrayView1;

use super::ComponentBuffer;
use super::cache::CellTopologyRecord;
use crate::disc::finite_element::FiniteElement;

/// Per-component admissible range around one cell.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentBounds {
    pub min: ComponentBuffer,
    pub max: ComponentBuffer,
}
impl ComponentBounds {
    /// Degenerate range containing only the cell's own mean.
    pub fn from_center(u_c: &[f64]) -> Self {
        Self {
            min: ComponentBuffer::from_slice(u_c),
            max: ComponentBuffer::from_slice(u_c),
        }
    }
    /// Widens the range by the means of the given neighbor cells. Empty DOF
    /// lists carry no cell and are skipped.
    pub fn fold_neighbors(
        &mut self,
        fe: &FiniteElement,
        neighbors: &[Vec<usize>],
        unlimited: ArrayView1<f64>,
        scratch: &mut [f64],
    ) {
        for dof_indices in neighbors.iter().filter(|d| !d.is_empty()) {
            fe.cell_means(dof_indices, unlimited, scratch);
            for (k, &value) in scratch.iter().enumerate() {
                if value < self.min[k] {
                    tracing::trace!(component = k, from = self.min[k], to = value, "decreasing min");
                    self.min[k] = value;
                }
                if value > self.max[k] {
                    tracing::trace!(component = k, from = self.max[k], to = value, "increasing max");
                    self.max[k] = value;
                }
            }
        }
    }
    pub fn contains(&self, component: usize, value: f64) -> bool {
        self.min[component] <= value && value <= self.max[component]
    }
}
/// Bounds of a cell seen from one of its vertices: its own mean and the
/// means of every other cell sharing that vertex.
pub fn compute_bounds(
    u_c: &[f64],
    record: &CellTopologyRecord,
    vertex: usize,
    fe: &FiniteElement,
    unlimited: ArrayView1<f64>,
) -> ComponentBounds {
    let mut bounds = ComponentBounds::from_center(u_c);
    let mut scratch = ComponentBuffer::from_elem(0.0, u_c.len());
    bounds.fold_neighbors(fe, &record.neighbor_dof_indices[vertex], unlimited, &mut scratch);
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disc::equations::Equations;
    use ndarray::Array1;

    #[test]
    fn test_bounds_cover_center_and_neighbors() {
        let fe = FiniteElement::dg_system(Equations::Euler, false).unwrap();
        // two neighbor cells, cell-major, constant mode of component k at local k
        let mut values = Array1::zeros(24);
        for k in 0..4 {
            values[k] = 1.0 + k as f64;
            values[12 + k] = -1.0 + k as f64;
        }
        let neighbors = vec![(0..12).collect::<Vec<_>>(), Vec::new(), (12..24).collect()];
        let u_c = [0.5, 0.5, 0.5, 0.5];
        let mut bounds = ComponentBounds::from_center(&u_c);
        let mut scratch = [0.0; 4];
        bounds.fold_neighbors(&fe, &neighbors, values.view(), &mut scratch);
        assert_eq!(bounds.min.as_slice(), &[-1.0, 0.0, 0.5, 0.5]);
        assert_eq!(bounds.max.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
        for k in 0..4 {
            assert!(bounds.contains(k, u_c[k]));
        }
    }

    #[test]
    fn test_no_neighbors_gives_degenerate_range() {
        let fe = FiniteElement::dg_system(Equations::Euler, false).unwrap();
        let values = Array1::zeros(12);
        let mut bounds = ComponentBounds::from_center(&[2.0, 0.0, 0.0, 1.0]);
        let mut scratch = [0.0; 4];
        bounds.fold_neighbors(&fe, &[], values.view(), &mut scratch);
        assert_eq!(bounds.min, bounds.max);
    }
}
