use crate::stats::ChartPoint;

/// X (session number) and Y (metric) upper bounds for the progress chart
pub fn compute_chart_params(points: &[ChartPoint]) -> (f64, f64) {
    let highest = points.iter().map(|p| p.value).fold(0.0, f64::max);

    let mut sessions = points.last().map(|p| p.game as f64).unwrap_or(1.0);
    if sessions < 2.0 {
        sessions = 2.0;
    }

    // headroom so the top point is not drawn on the frame
    let mut ceiling = (highest + highest / 10.0).ceil();
    if ceiling < 1.0 {
        ceiling = 1.0;
    }

    (sessions, ceiling)
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn point(game: usize, value: f64) -> ChartPoint {
        ChartPoint {
            game,
            value,
            accuracy: None,
            date: Utc::now(),
        }
    }

    #[test]
    fn test_compute_chart_params_empty() {
        let (x, y) = compute_chart_params(&[]);
        assert_eq!(x, 2.0);
        assert_eq!(y, 1.0);
    }

    #[test]
    fn test_compute_chart_params_adds_headroom() {
        let (x, y) = compute_chart_params(&[point(1, 200.0), point(2, 300.0), point(3, 250.0)]);
        assert_eq!(x, 3.0);
        assert_eq!(y, 330.0);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
