use ndarray::{ArrayView1, ArrayViewMut1};

use super::bounds::ComponentBounds;
use super::cache::TopologyCache;
use super::factor::tighten_factors;
use super::scaling::{VectorFieldScaling, applied_factors, apply_scaling};
use super::{ComponentBuffer, LimiterContext, LimitingReport, SlopeLimiter, begin_pass, finish_pass};
use crate::disc::mesh::PeriodicPair;
use crate::disc::mesh::mesh2d::Element2d;
use crate::error::LimiterResult;
use crate::io::param_parser::LimiterParameters;

/// Barth–Jespersen limiter: one range per cell, built from the means of
/// every cell sharing any of its vertices, then checked at all vertices.
#[derive(Clone, Debug)]
pub struct BarthJespersenSlopeLimiter {
    cache: TopologyCache,
    pub periodic_boundaries: Vec<PeriodicPair>,
}
impl BarthJespersenSlopeLimiter {
    pub fn new(params: &LimiterParameters) -> Self {
        Self {
            cache: TopologyCache::new(),
            periodic_boundaries: params.periodic_boundaries.clone(),
        }
    }
    pub fn cache(&self) -> &TopologyCache {
        &self.cache
    }
}
impl SlopeLimiter for BarthJespersenSlopeLimiter {
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
        let mut u_c = ComponentBuffer::from_elem(0.0, component_num);
        let mut u_i = ComponentBuffer::from_elem(0.0, component_num);
        let mut scratch = ComponentBuffer::from_elem(0.0, component_num);
        for ielem in ctx.mesh.locally_owned_elements(ctx.rank) {
            let (record, cache_miss) =
                self.cache
                    .get_or_build(ctx, ielem, &self.periodic_boundaries)?;
            let dof_indices = ctx.dof_handler.cell_dof_indices(ielem);
            fe.cell_means(dof_indices, unlimited, &mut u_c);

            let mut bounds = ComponentBounds::from_center(&u_c);
            for neighbors in &record.neighbor_dof_indices {
                bounds.fold_neighbors(fe, neighbors, unlimited, &mut scratch);
            }
            let mut alpha = ComponentBuffer::from_elem(1.0, component_num);
            for modes in &record.vertex_modes {
                fe.point_values(modes, dof_indices, unlimited, &mut u_i);
                tighten_factors(&mut alpha, &u_c, &u_i, &bounds);
            }
            tracing::trace!(ielem, center = ?record.center, u_c = ?u_c, ?alpha, "barth-jespersen factors");
            apply_scaling(
                &mut limited,
                record,
                &alpha,
                fe.vector_field.as_ref(),
                VectorFieldScaling::ComponentWise,
            );
            applied_factors(
                &mut alpha,
                record,
                fe.vector_field.as_ref(),
                VectorFieldScaling::ComponentWise,
            );
            report.record_cell(ielem, &alpha, cache_miss);
        }
        finish_pass(name, &report);
        Ok(report)
    }
    fn name(&self) -> &'static str {
        "barth-jespersen"
    }
}
