pub mod barth_jespersen;
pub mod bounds;
pub mod cache;
pub mod factor;
pub mod scaling;
pub mod vertex_based;

use ndarray::{Array2, ArrayView1, ArrayViewMut1};
use smallvec::SmallVec;

pub use barth_jespersen::BarthJespersenSlopeLimiter;
pub use cache::{CellTopologyRecord, TopologyCache};
pub use vertex_based::VertexBasedSlopeLimiter;

use crate::disc::dof_handler::DofHandler;
use crate::disc::finite_element::FiniteElement;
use crate::disc::mesh::mesh2d::{Element2d, Mesh2d};
use crate::error::{LimiterError, LimiterResult};
use crate::io::param_parser::{LimiterParameters, SlopeLimiterKind};

/// Relative nudge of vertex points toward the cell center, and the relative
/// deviation below which a point value is treated as equal to the mean.
pub const NEGLIGIBLE: f64 = 1e-12;
/// Cell means smaller than this in magnitude are never limited.
pub const SMALL: f64 = 1e-8;

/// One value per system component of a single cell.
pub type ComponentBuffer = SmallVec<[f64; 8]>;

/// Discretization the limiter runs on, borrowed for one pass.
pub struct LimiterContext<'a, T: Element2d> {
    pub mesh: &'a Mesh2d<T>,
    pub dof_handler: &'a DofHandler,
    pub fe: &'a FiniteElement,
    /// Only cells owned by this rank are processed.
    pub rank: usize,
}
impl<'a, T: Element2d> LimiterContext<'a, T> {
    pub fn new(mesh: &'a Mesh2d<T>, dof_handler: &'a DofHandler, fe: &'a FiniteElement) -> Self {
        Self {
            mesh,
            dof_handler,
            fe,
            rank: 0,
        }
    }
    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }
    fn check(&self, limited_len: usize, unlimited_len: usize) -> LimiterResult<()> {
        let generation = self.dof_handler.generation();
        if generation.mesh != self.mesh.generation {
            return Err(LimiterError::OutdatedDofHandler {
                dof_generation: generation.mesh,
                mesh_generation: self.mesh.generation,
            });
        }
        if self.dof_handler.elem_num != self.mesh.elem_num {
            return Err(LimiterError::dimension_mismatch(
                "cells",
                self.mesh.elem_num,
                self.dof_handler.elem_num,
            ));
        }
        if self.dof_handler.dofs_per_cell != self.fe.dofs_per_cell() {
            return Err(LimiterError::dimension_mismatch(
                "dofs per cell",
                self.fe.dofs_per_cell(),
                self.dof_handler.dofs_per_cell,
            ));
        }
        let n_dofs = self.dof_handler.n_dofs();
        if unlimited_len != n_dofs {
            return Err(LimiterError::dimension_mismatch(
                "unlimited solution",
                n_dofs,
                unlimited_len,
            ));
        }
        if limited_len != n_dofs {
            return Err(LimiterError::dimension_mismatch(
                "limited solution",
                n_dofs,
                limited_len,
            ));
        }
        Ok(())
    }
}

/// Outcome of one limiting pass.
#[derive(Clone, Debug)]
pub struct LimitingReport {
    pub cells_visited: usize,
    pub cache_misses: usize,
    /// Cells where at least one factor dropped below one.
    pub cells_limited: usize,
    /// Factor applied to the non-constant DOFs of each cell and component;
    /// one for cells not visited. Field components report the factor of the
    /// vector-field scaling mode, so an unlimited field stays at one.
    pub alpha: Array2<f64>,
}
impl LimitingReport {
    fn new(elem_num: usize, component_num: usize) -> Self {
        Self {
            cells_visited: 0,
            cache_misses: 0,
            cells_limited: 0,
            alpha: Array2::ones((elem_num, component_num)),
        }
    }
    fn record_cell(&mut self, ielem: usize, alpha: &[f64], cache_miss: bool) {
        self.cells_visited += 1;
        if cache_miss {
            self.cache_misses += 1;
        }
        if alpha.iter().any(|&a| a < 1.0) {
            self.cells_limited += 1;
        }
        for (k, &a) in alpha.iter().enumerate() {
            self.alpha[[ielem, k]] = a;
        }
    }
    pub fn min_factor(&self, component: usize) -> f64 {
        self.alpha
            .column(component)
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min)
    }
}

/// Post-processing step that pulls a DG solution back inside the range of
/// the surrounding cell means.
pub trait SlopeLimiter {
    /// Drops every cached cell record. Must be called whenever the mesh or
    /// the DOF numbering changes.
    fn flush_cache(&mut self);
    /// Scales the non-constant DOFs of `limited`, which the caller has
    /// filled with a copy of `unlimited`. Bounds and point values are always
    /// read from `unlimited`.
    fn postprocess<T: Element2d>(
        &mut self,
        ctx: &LimiterContext<T>,
        limited: ArrayViewMut1<f64>,
        unlimited: ArrayView1<f64>,
    ) -> LimiterResult<LimitingReport>;
    fn name(&self) -> &'static str;
}

/// Validates the inputs of a pass and invalidates `cache` if the topology
/// moved on without a flush.
fn begin_pass<T: Element2d>(
    name: &'static str,
    ctx: &LimiterContext<T>,
    cache: &mut TopologyCache,
    limited: &ArrayViewMut1<f64>,
    unlimited: &ArrayView1<f64>,
) -> LimiterResult<LimitingReport> {
    ctx.check(limited.len(), unlimited.len())?;
    let generation = ctx.dof_handler.generation();
    let cached = cache.generation();
    if cache.sync_generation(generation) {
        tracing::warn!(
            limiter = name,
            ?cached,
            ?generation,
            "topology changed without flush_cache, cached cell records discarded"
        );
    }
    Ok(LimitingReport::new(ctx.mesh.elem_num, ctx.fe.component_num))
}

fn finish_pass(name: &'static str, report: &LimitingReport) {
    tracing::debug!(
        limiter = name,
        cells_visited = report.cells_visited,
        cache_misses = report.cache_misses,
        cells_limited = report.cells_limited,
        "limiting pass done"
    );
}

#[derive(Clone, Debug)]
pub enum Limiter {
    VertexBased(VertexBasedSlopeLimiter),
    BarthJespersen(BarthJespersenSlopeLimiter),
}
impl Limiter {
    pub fn from_params(params: &LimiterParameters) -> Self {
        match params.slope_limiter {
            SlopeLimiterKind::VertexBased => Self::VertexBased(VertexBasedSlopeLimiter::new(params)),
            SlopeLimiterKind::BarthJespersen => {
                Self::BarthJespersen(BarthJespersenSlopeLimiter::new(params))
            }
        }
    }
    pub fn cache(&self) -> &TopologyCache {
        match self {
            Self::VertexBased(limiter) => limiter.cache(),
            Self::BarthJespersen(limiter) => limiter.cache(),
        }
    }
}
impl SlopeLimiter for Limiter {
    fn flush_cache(&mut self) {
        match self {
            Self::VertexBased(limiter) => limiter.flush_cache(),
            Self::BarthJespersen(limiter) => limiter.flush_cache(),
        }
    }
    fn postprocess<T: Element2d>(
        &mut self,
        ctx: &LimiterContext<T>,
        limited: ArrayViewMut1<f64>,
        unlimited: ArrayView1<f64>,
    ) -> LimiterResult<LimitingReport> {
        match self {
            Self::VertexBased(limiter) => limiter.postprocess(ctx, limited, unlimited),
            Self::BarthJespersen(limiter) => limiter.postprocess(ctx, limited, unlimited),
        }
    }
    fn name(&self) -> &'static str {
        match self {
            Self::VertexBased(limiter) => limiter.name(),
            Self::BarthJespersen(limiter) => limiter.name(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use ndarray::Array1;

    use crate::disc::basis::MODE_NUM;
    use crate::disc::dof_handler::DofHandler;
    use crate::disc::finite_element::FiniteElement;
    use crate::disc::mesh::mesh2d::{Element2d, Mesh2d};

    /// Global vector whose cell `ielem` carries the modal coefficients
    /// `coefficients(ielem)[component][mode]`.
    pub fn modal_vector<T: Element2d>(
        mesh: &Mesh2d<T>,
        dofs: &DofHandler,
        fe: &FiniteElement,
        coefficients: impl Fn(usize) -> Vec<[f64; MODE_NUM]>,
    ) -> Array1<f64> {
        let mut values = Array1::zeros(dofs.n_dofs());
        for ielem in 0..mesh.elem_num {
            let local = fe.dof_values_from_modal(&coefficients(ielem));
            for (&dof, value) in dofs.cell_dof_indices(ielem).iter().zip(local) {
                values[dof] = value;
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disc::equations::Equations;
    use crate::disc::mesh::mesh2d::QuadrilateralElement;
    use ndarray::Array1;

    fn setup() -> (Mesh2d<QuadrilateralElement>, FiniteElement) {
        let mesh = Mesh2d::create_quad_mesh(2, 2, 0.0, 1.0, 0.0, 1.0);
        let fe = FiniteElement::dg_system(Equations::Euler, false).unwrap();
        (mesh, fe)
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let (mesh, fe) = setup();
        let dofs = DofHandler::distribute(&mesh, &fe);
        let ctx = LimiterContext::new(&mesh, &dofs, &fe);
        let mut limiter = Limiter::from_params(&LimiterParameters::default());
        let unlimited = Array1::zeros(dofs.n_dofs());
        let mut limited = Array1::zeros(dofs.n_dofs() - 1);
        let result = limiter.postprocess(&ctx, limited.view_mut(), unlimited.view());
        assert!(matches!(
            result,
            Err(LimiterError::DimensionMismatch {
                what: "limited solution",
                ..
            })
        ));
    }

    #[test]
    fn test_outdated_dof_handler_is_rejected() {
        let (mut mesh, fe) = setup();
        let dofs = DofHandler::distribute(&mesh, &fe);
        mesh.partition(1);
        let ctx = LimiterContext::new(&mesh, &dofs, &fe);
        let mut limiter = Limiter::from_params(&LimiterParameters::default());
        let unlimited = Array1::zeros(dofs.n_dofs());
        let mut limited = unlimited.clone();
        let result = limiter.postprocess(&ctx, limited.view_mut(), unlimited.view());
        match result {
            Err(LimiterError::OutdatedDofHandler {
                dof_generation,
                mesh_generation,
            }) => {
                assert_eq!(dof_generation, dofs.generation().mesh);
                assert_eq!(mesh_generation, mesh.generation);
            }
            other => panic!("expected OutdatedDofHandler, got {other:?}"),
        }
    }

    #[test]
    fn test_from_params_selects_variant() {
        let mut params = LimiterParameters::default();
        let limiter = Limiter::from_params(&params);
        assert_eq!(limiter.name(), "vertex-based");
        params.slope_limiter = SlopeLimiterKind::BarthJespersen;
        let limiter = Limiter::from_params(&params);
        assert!(matches!(limiter, Limiter::BarthJespersen(_)));
        assert!(limiter.cache().is_empty());
    }
}
