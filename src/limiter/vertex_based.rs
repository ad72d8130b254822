use ndarray::{ArrayView1, ArrayViewMut1};

use super::bounds::compute_bounds;
use super::cache::TopologyCache;
use super::factor::tighten_factors;
use super::scaling::{VectorFieldScaling, applied_factors, apply_scaling};
use super::{ComponentBuffer, LimiterContext, LimitingReport, SlopeLimiter, begin_pass, finish_pass};
use crate::disc::mesh::PeriodicPair;
use crate::disc::mesh::mesh2d::Element2d;
use crate::error::LimiterResult;
use crate::io::param_parser::LimiterParameters;

/// Kuzmin-type vertex-based limiter: each vertex is checked against the
/// means of the cells sharing that vertex only.
#[derive(Clone, Debug)]
pub struct VertexBasedSlopeLimiter {
    cache: TopologyCache,
    pub limit_b: bool,
    pub limit_edges_and_vertices: bool,
    /// Below this many neighbors a cell counts as sitting in a sparse
    /// corner of the mesh.
    pub sparse_vertex_neighbor_threshold: usize,
    pub periodic_boundaries: Vec<PeriodicPair>,
}
impl VertexBasedSlopeLimiter {
    pub fn new(params: &LimiterParameters) -> Self {
        Self {
            cache: TopologyCache::new(),
            limit_b: params.limit_b,
            limit_edges_and_vertices: params.limit_edges_and_vertices,
            sparse_vertex_neighbor_threshold: params.sparse_vertex_neighbor_threshold,
            periodic_boundaries: params.periodic_boundaries.clone(),
        }
    }
    pub fn cache(&self) -> &TopologyCache {
        &self.cache
    }
}
impl SlopeLimiter for VertexBasedSlopeLimiter {
    fn flush_cache(&mut self) {
        self.cache.flush();
    }
    fn postprocess<T: Element2d>(
        &mut self,
        ctx: &LimiterContext<T>,
        mut limited: ArrayViewMut1<f64>,
        unlimited: ArrayView1<f64>,
    ) -> LimiterResult<LimitingReport> {
        let name = self.name();
        let mut report = begin_pass(name, ctx, &mut self.cache, &limited, &unlimited)?;
        let fe = ctx.fe;
        let component_num = fe.component_num;
        let scaling = if self.limit_b {
            VectorFieldScaling::Joint
        } else {
            VectorFieldScaling::Unlimited
        };
        let mut u_c = ComponentBuffer::from_elem(0.0, component_num);
        let mut u_i = ComponentBuffer::from_elem(0.0, component_num);
        for ielem in ctx.mesh.locally_owned_elements(ctx.rank) {
            let (record, cache_miss) =
                self.cache
                    .get_or_build(ctx, ielem, &self.periodic_boundaries)?;
            let dof_indices = ctx.dof_handler.cell_dof_indices(ielem);
            fe.cell_means(dof_indices, unlimited, &mut u_c);
            let mut alpha = ComponentBuffer::from_elem(1.0, component_num);
            for vertex in 0..record.vertex_point.len() {
                if !self.limit_edges_and_vertices
                    && record.neighbor_count < self.sparse_vertex_neighbor_threshold
                    && record.vertex_is_at_nonperiodic_boundary[vertex]
                {
                    continue;
                }
                fe.point_values(&record.vertex_modes[vertex], dof_indices, unlimited, &mut u_i);
                let bounds = compute_bounds(&u_c, record, vertex, fe, unlimited);
                tighten_factors(&mut alpha, &u_c, &u_i, &bounds);
            }
            tracing::trace!(ielem, center = ?record.center, u_c = ?u_c, ?alpha, "vertex-based factors");
            apply_scaling(
                &mut limited,
                record,
                &alpha,
                fe.vector_field.as_ref(),
                scaling,
            );
            applied_factors(&mut alpha, record, fe.vector_field.as_ref(), scaling);
            report.record_cell(ielem, &alpha, cache_miss);
        }
        finish_pass(name, &report);
        Ok(report)
    }
    fn name(&self) -> &'static str {
        "vertex-based"
    }
}
