use super::bounds::ComponentBounds;
use super::{NEGLIGIBLE, SMALL};

/// Largest factor in `[.., 1]` keeping `u_c + factor * (u_i - u_c)` inside
/// `[min, max]`. `None` when the point value does not deviate from the mean.
///
/// The factor is not clamped from below. With an inconsistent range that
/// excludes `u_c` it comes out negative and flips the slope.
pub fn solve_factor(u_c: f64, u_i: f64, min: f64, max: f64) -> Option<f64> {
    let deviation = ((u_c - u_i) / u_c).abs();
    if deviation.is_nan() || deviation <= NEGLIGIBLE {
        return None;
    }
    let delta = u_i - u_c;
    let factor = if delta > 0.0 {
        (max - u_c) / delta
    } else {
        (min - u_c) / delta
    };
    Some(factor.min(1.0))
}

/// Tightens the running per-component factors with the point values `u_i`
/// at one vertex. Components whose mean is near zero, or whose point value
/// already lies in range, are left alone.
pub fn tighten_factors(alpha: &mut [f64], u_c: &[f64], u_i: &[f64], bounds: &ComponentBounds) {
    for k in 0..alpha.len() {
        if u_c[k].abs() < SMALL || bounds.contains(k, u_i[k]) {
            continue;
        }
        if let Some(factor) = solve_factor(u_c[k], u_i[k], bounds.min[k], bounds.max[k]) {
            if factor < alpha[k] {
                tracing::trace!(component = k, u_c = u_c[k], u_i = u_i[k], factor, "new factor");
                alpha[k] = factor;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_overshoot_is_cut_to_bound() {
        assert_relative_eq!(solve_factor(1.0, 2.0, 0.5, 1.5).unwrap(), 0.5);
        assert_relative_eq!(solve_factor(1.0, 0.0, 0.75, 1.5).unwrap(), 0.25);
    }

    #[test]
    fn test_point_inside_range_is_unconstrained() {
        assert_relative_eq!(solve_factor(1.0, 1.2, 0.5, 1.5).unwrap(), 1.0);
    }

    #[test]
    fn test_negligible_deviation_places_no_constraint() {
        assert_eq!(solve_factor(1.0, 1.0 + 1e-14, 1.0, 1.0), None);
        assert_eq!(solve_factor(3.0, 3.0, 3.0, 3.0), None);
    }

    #[test]
    fn test_local_extremum_flattens() {
        assert_relative_eq!(solve_factor(2.0, 2.5, 1.0, 2.0).unwrap(), 0.0);
    }

    #[test]
    fn test_inconsistent_range_gives_negative_factor() {
        let factor = solve_factor(1.0, 2.0, 0.0, 0.5).unwrap();
        assert_relative_eq!(factor, -0.5);
    }

    #[test]
    fn test_small_means_are_skipped() {
        let bounds = ComponentBounds::from_center(&[1e-9, 1.0]);
        let mut alpha = [1.0, 1.0];
        tighten_factors(&mut alpha, &[1e-9, 1.0], &[5.0, 3.0], &bounds);
        assert_eq!(alpha[0], 1.0);
        assert_relative_eq!(alpha[1], 0.0);
    }

    #[test]
    fn test_factors_only_decrease() {
        let bounds = ComponentBounds {
            min: [0.0].into_iter().collect(),
            max: [2.0].into_iter().collect(),
        };
        let mut alpha = [0.3];
        tighten_factors(&mut alpha, &[1.0], &[1.5], &bounds);
        assert_relative_eq!(alpha[0], 0.3);
        tighten_factors(&mut alpha, &[1.0], &[6.0], &bounds);
        assert_relative_eq!(alpha[0], 0.2);
    }
}
