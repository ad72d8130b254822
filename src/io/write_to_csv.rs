use std::fs;
use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;

use crate::disc::mesh::mesh2d::{Element2d, Mesh2d};
use crate::error::LimiterResult;
use crate::limiter::LimitingReport;

#[derive(Serialize)]
struct CellFactors<'a> {
    ielem: usize,
    x: f64,
    y: f64,
    alpha: &'a [f64],
}

/// One row per cell owned by `rank`: index, center and the final factor of
/// every component.
pub fn write_factors_to_csv<T: Element2d>(
    report: &LimitingReport,
    mesh: &Mesh2d<T>,
    rank: usize,
    filename: &str,
) -> LimiterResult<()> {
    let component_num = report.alpha.ncols();
    if let Some(parent) = Path::new(filename).parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = WriterBuilder::new().has_headers(false).from_path(filename)?;
    let mut header = vec!["ielem".to_string(), "x".to_string(), "y".to_string()];
    header.extend((0..component_num).map(|k| format!("alpha_{k}")));
    writer.write_record(&header)?;
    let mut alpha = vec![0.0; component_num];
    for ielem in mesh.locally_owned_elements(rank) {
        let [x, y] = mesh.element_center(ielem);
        for (k, a) in alpha.iter_mut().enumerate() {
            *a = report.alpha[[ielem, k]];
        }
        writer.serialize(CellFactors {
            ielem,
            x,
            y,
            alpha: &alpha,
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disc::mesh::mesh2d::QuadrilateralElement;
    use ndarray::Array2;

    #[test]
    fn test_factor_rows() {
        let mesh: Mesh2d<QuadrilateralElement> = Mesh2d::create_quad_mesh(2, 1, 0.0, 2.0, 0.0, 1.0);
        let mut alpha = Array2::ones((2, 2));
        alpha[[1, 0]] = 0.25;
        let report = LimitingReport {
            cells_visited: 2,
            cache_misses: 2,
            cells_limited: 1,
            alpha,
        };
        let path = std::env::temp_dir().join("dg_slope_limiter_factors_test.csv");
        let filename = path.to_string_lossy().into_owned();
        write_factors_to_csv(&report, &mesh, 0, &filename).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["ielem,x,y,alpha_0,alpha_1", "0,0.5,0.5,1.0,1.0", "1,1.5,0.5,0.25,1.0"]);
        std::fs::remove_file(&path).unwrap();
    }
}
