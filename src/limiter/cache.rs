use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use smallvec::SmallVec;

use super::{LimiterContext, NEGLIGIBLE};
use crate::disc::basis::{MODE_NUM, ModalBasis};
use crate::disc::dof_handler::TopologyGeneration;
use crate::disc::geometric::{nudge_toward_center, transform_real_to_unit_cell};
use crate::disc::mesh::{PeriodicPair, is_periodic_boundary};
use crate::disc::mesh::mesh2d::Element2d;
use crate::error::LimiterResult;

/// Everything the limiter needs about one locally owned cell that depends
/// only on mesh topology and DOF numbering.
#[derive(Clone, Debug)]
pub struct CellTopologyRecord {
    pub center: [f64; 2],
    /// Vertices pulled toward `center` by a negligible fraction.
    pub vertex_point: SmallVec<[[f64; 2]; 4]>,
    /// Modal basis evaluated at each `vertex_point`.
    pub vertex_modes: SmallVec<[[f64; MODE_NUM]; 4]>,
    pub vertex_is_at_nonperiodic_boundary: SmallVec<[bool; 4]>,
    /// Per primitive component, its non-constant DOFs.
    pub lambda_indices_to_multiply: Vec<Vec<usize>>,
    /// Non-constant DOFs of the non-primitive vector field.
    pub lambda_indices_to_multiply_all_b_components: Vec<usize>,
    /// Per vertex, the full DOF list of every other cell touching it.
    pub neighbor_dof_indices: Vec<Vec<Vec<usize>>>,
    /// Neighbor count of the last vertex scanned while building.
    pub neighbor_count: usize,
}
impl CellTopologyRecord {
    pub fn build<T: Element2d>(
        ctx: &LimiterContext<T>,
        ielem: usize,
        periodic_boundaries: &[PeriodicPair],
    ) -> LimiterResult<Self> {
        let mesh = ctx.mesh;
        let fe = ctx.fe;
        let elem = &mesh.elements[ielem];
        let dof_indices = ctx.dof_handler.cell_dof_indices(ielem);

        let mut lambda_indices_to_multiply = vec![Vec::new(); fe.component_num];
        let mut lambda_indices_to_multiply_all_b_components = Vec::new();
        for (i, sf) in fe.shape_functions.iter().enumerate() {
            // the constant mode carries the cell mean and is never scaled
            if sf.mode == 0 {
                continue;
            }
            if sf.is_primitive() {
                lambda_indices_to_multiply[sf.system_component()].push(dof_indices[i]);
            } else {
                lambda_indices_to_multiply_all_b_components.push(dof_indices[i]);
            }
        }

        let vertex_num = elem.inodes().len();
        let mut vertex_is_at_nonperiodic_boundary: SmallVec<[bool; 4]> =
            SmallVec::from_elem(false, vertex_num);
        for (local_edge, &iedge) in elem.iedges().iter().enumerate() {
            let edge = &mesh.edges[iedge];
            let Some(boundary_id) = edge.boundary_id else {
                continue;
            };
            if is_periodic_boundary(periodic_boundaries, boundary_id) {
                continue;
            }
            for v in T::edge_vertices(local_edge) {
                vertex_is_at_nonperiodic_boundary[v] = true;
            }
        }

        let center = mesh.element_center(ielem);
        let (x, y) = mesh.element_coords(ielem);
        let mut vertex_point = SmallVec::with_capacity(vertex_num);
        let mut vertex_modes = SmallVec::with_capacity(vertex_num);
        let mut neighbor_dof_indices = Vec::with_capacity(vertex_num);
        let mut neighbor_count = 0;
        for (v, &inode) in elem.inodes().iter().enumerate() {
            let node = mesh.nodes[inode];
            let point = nudge_toward_center(center, [node.x, node.y], NEGLIGIBLE);
            let reference = transform_real_to_unit_cell::<T>(ielem, &x, &y, point)?;
            let [xi, eta] = T::project_to_unit_cell(reference);
            vertex_point.push(point);
            vertex_modes.push(T::Basis::evaluate_modes(xi, eta));

            let neighbors: Vec<Vec<usize>> = mesh
                .cells_adjacent_to_vertex(inode)
                .iter()
                .filter(|&&ineighbor| ineighbor != ielem)
                .map(|&ineighbor| ctx.dof_handler.cell_dof_indices(ineighbor).to_vec())
                .collect();
            neighbor_count = neighbors.len();
            tracing::trace!(ielem, vertex = v, neighbors = neighbors.len(), "cached vertex stencil");
            neighbor_dof_indices.push(neighbors);
        }

        Ok(Self {
            center,
            vertex_point,
            vertex_modes,
            vertex_is_at_nonperiodic_boundary,
            lambda_indices_to_multiply,
            lambda_indices_to_multiply_all_b_components,
            neighbor_dof_indices,
            neighbor_count,
        })
    }
}
/// Lazily built per-cell records, valid for a single topology generation.
#[derive(Clone, Debug, Default)]
pub struct TopologyCache {
    records: HashMap<usize, CellTopologyRecord>,
    generation: Option<TopologyGeneration>,
}
impl TopologyCache {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn flush(&mut self) {
        self.records.clear();
        self.generation = None;
    }
    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
    pub fn get(&self, ielem: usize) -> Option<&CellTopologyRecord> {
        self.records.get(&ielem)
    }
    pub fn generation(&self) -> Option<TopologyGeneration> {
        self.generation
    }
    /// Ties the cache to `generation`, dropping every record built for a
    /// different one. Returns true if records were dropped.
    pub fn sync_generation(&mut self, generation: TopologyGeneration) -> bool {
        match self.generation {
            Some(current) if current == generation => false,
            _ => {
                let dropped = !self.records.is_empty();
                self.records.clear();
                self.generation = Some(generation);
                dropped
            }
        }
    }
    /// The record of `ielem`, built on first request. The flag is true on a
    /// cache miss.
    pub fn get_or_build<T: Element2d>(
        &mut self,
        ctx: &LimiterContext<T>,
        ielem: usize,
        periodic_boundaries: &[PeriodicPair],
    ) -> LimiterResult<(&CellTopologyRecord, bool)> {
        match self.records.entry(ielem) {
            Entry::Occupied(entry) => Ok((entry.into_mut(), false)),
            Entry::Vacant(entry) => {
                let record = CellTopologyRecord::build(ctx, ielem, periodic_boundaries)?;
                Ok((entry.insert(record), true))
            }
        }
    }
}
