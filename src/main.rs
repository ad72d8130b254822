use std::env;
use std::process::ExitCode;

use ndarray::Array1;
use tracing_subscriber::EnvFilter;

use dg_slope_limiter::disc::dof_handler::DofHandler;
use dg_slope_limiter::disc::finite_element::FiniteElement;
use dg_slope_limiter::disc::mesh::mesh2d::{Element2d, Mesh2d};
use dg_slope_limiter::error::LimiterResult;
use dg_slope_limiter::initialization;
use dg_slope_limiter::io::param_parser::{ElementKind, RunParameters};
use dg_slope_limiter::io::write_to_csv::write_factors_to_csv;
use dg_slope_limiter::limiter::{LimiterContext, LimitingReport};
use dg_slope_limiter::solver::LimitingStep;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let file_path = env::args()
        .nth(1)
        .unwrap_or_else(|| "inputs/limiterparam.json".to_string());
    match run(&file_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(%e, file_path = %file_path, "limiting run failed");
            ExitCode::FAILURE
        }
    }
}

fn run(file_path: &str) -> LimiterResult<()> {
    let params = initialization::initialize_params_by_file(file_path)?;
    let fe = initialization::initialize_finite_element(&params)?;
    match params.element {
        ElementKind::Triangle => run_on_mesh(initialization::initialize_tri_mesh(&params), &fe, &params),
        ElementKind::Quadrilateral => {
            run_on_mesh(initialization::initialize_quad_mesh(&params), &fe, &params)
        }
    }
}

/// Expanding blast sampled at every time step, limited rank by rank. Each
/// rank owns its limiter and its copy of the solution.
fn run_on_mesh<T: Element2d>(
    mut mesh: Mesh2d<T>,
    fe: &FiniteElement,
    params: &RunParameters,
) -> LimiterResult<()> {
    let mut dofs = DofHandler::distribute(&mesh, fe);
    let mut steps: Vec<LimitingStep> = (0..mesh.n_ranks)
        .map(|_| LimitingStep::new(&params.limiter))
        .collect();
    let step_num = (params.final_time / params.time_step).ceil() as usize;
    let refine_every = if params.refinements > 0 {
        (step_num / (params.refinements + 1)).max(1)
    } else {
        usize::MAX
    };
    let center = [
        0.5 * (params.lower_left[0] + params.upper_right[0]),
        0.5 * (params.lower_left[1] + params.upper_right[1]),
    ];
    let initial_radius = 0.1 * (params.upper_right[0] - params.lower_left[0]);

    let mut refinements_done = 0;
    let mut reports: Vec<Option<LimitingReport>> = vec![None; mesh.n_ranks];
    for istep in 0..=step_num {
        let time = (istep as f64 * params.time_step).min(params.final_time);
        if istep > 0 && istep % refine_every == 0 && refinements_done < params.refinements {
            mesh = mesh.refine_uniform();
            dofs = DofHandler::distribute(&mesh, fe);
            for step in steps.iter_mut() {
                step.on_topology_change();
            }
            refinements_done += 1;
            tracing::info!(elem_num = mesh.elem_num, n_dofs = dofs.n_dofs(), "mesh refined");
        }
        let radius = initial_radius * (1.0 + time);
        let unlimited = initialization::project_initial_condition(&mesh, &dofs, fe, |x, y| {
            initialization::blast_state(params.equations, center, radius, x, y)
        })?;

        let mut limited = Array1::zeros(dofs.n_dofs());
        let mut rank_limited = Array1::zeros(dofs.n_dofs());
        let mut cells_limited = 0;
        let mut min_density_factor = 1.0_f64;
        for (rank, step) in steps.iter_mut().enumerate() {
            let ctx = LimiterContext::new(&mesh, &dofs, fe).with_rank(rank);
            reports[rank] = step.apply(&ctx, time, rank_limited.view_mut(), unlimited.view())?;
            if let Some(report) = &reports[rank] {
                cells_limited += report.cells_limited;
                min_density_factor = min_density_factor.min(report.min_factor(0));
            }
            for ielem in mesh.locally_owned_elements(rank) {
                for &dof in dofs.cell_dof_indices(ielem) {
                    limited[dof] = rank_limited[dof];
                }
            }
        }
        let max_change = (&limited - &unlimited)
            .iter()
            .fold(0.0_f64, |acc, d| acc.max(d.abs()));
        tracing::info!(
            istep,
            time,
            cells_limited,
            min_density_factor,
            max_change,
            "time step done"
        );
    }

    if let Some(filename) = &params.factors_csv {
        for (rank, report) in reports.iter().enumerate() {
            let Some(report) = report else {
                continue;
            };
            let filename = if mesh.n_ranks == 1 {
                filename.clone()
            } else {
                format!("{filename}.{rank}")
            };
            write_factors_to_csv(report, &mesh, rank, &filename)?;
            tracing::info!(rank, filename = %filename, "limiting factors written");
        }
    }
    Ok(())
}
