use ndarray::{ArrayView1, ArrayViewMut1};

use crate::disc::mesh::mesh2d::Element2d;
use crate::error::{LimiterError, LimiterResult};
use crate::io::param_parser::LimiterParameters;
use crate::limiter::{Limiter, LimiterContext, LimitingReport, SlopeLimiter};

/// Limiter as seen from the time loop: the master switch, the start time
/// and cache invalidation on mesh changes.
pub struct LimitingStep {
    pub limit: bool,
    pub start_limiting_at: f64,
    limiter: Limiter,
}
impl LimitingStep {
    pub fn new(params: &LimiterParameters) -> Self {
        Self {
            limit: params.limit,
            start_limiting_at: params.start_limiting_at,
            limiter: Limiter::from_params(params),
        }
    }
    pub fn limiter(&self) -> &Limiter {
        &self.limiter
    }
    /// To be called after every refinement, repartitioning or DOF
    /// renumbering.
    pub fn on_topology_change(&mut self) {
        self.limiter.flush_cache();
        tracing::info!(
            limiter = self.limiter.name(),
            "topology changed, limiter cache flushed"
        );
    }
    pub fn is_active(&self, time: f64) -> bool {
        self.limit && time >= self.start_limiting_at
    }
    /// Writes the limited counterpart of `unlimited` into `limited`. Returns
    /// `None` when limiting is switched off or has not started yet, in which
    /// case `limited` is a plain copy.
    pub fn apply<T: Element2d>(
        &mut self,
        ctx: &LimiterContext<T>,
        time: f64,
        mut limited: ArrayViewMut1<f64>,
        unlimited: ArrayView1<f64>,
    ) -> LimiterResult<Option<LimitingReport>> {
        if limited.len() != unlimited.len() {
            return Err(LimiterError::dimension_mismatch(
                "limited solution",
                unlimited.len(),
                limited.len(),
            ));
        }
        limited.assign(&unlimited);
        if !self.is_active(time) {
            return Ok(None);
        }
        let report = self.limiter.postprocess(ctx, limited, unlimited)?;
        Ok(Some(report))
    }
}
