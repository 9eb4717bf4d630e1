use super::config::InterfaceBounds;
use crate::core::models::candidate::{InterfaceMetrics, RejectionReason};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InterfaceQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl fmt::Display for InterfaceQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InterfaceQuality::Poor => "poor",
            InterfaceQuality::Fair => "fair",
            InterfaceQuality::Good => "good",
            InterfaceQuality::Excellent => "excellent",
        };
        f.write_str(label)
    }
}

fn dg_points(dg_dsasa: f64) -> u32 {
    if dg_dsasa < -10.0 {
        3
    } else if dg_dsasa < -5.0 {
        2
    } else if dg_dsasa < -1.0 {
        1
    } else {
        0
    }
}

fn packstat_points(packstat: f64) -> u32 {
    if packstat > 0.7 {
        3
    } else if packstat > 0.5 {
        2
    } else if packstat > 0.3 {
        1
    } else {
        0
    }
}

fn buns_points(buns: f64) -> u32 {
    if buns < 2.0 {
        3
    } else if buns < 5.0 {
        2
    } else if buns < 10.0 {
        1
    } else {
        0
    }
}

/// Point total behind [`assess`]; at most 10.
pub fn quality_points(metrics: &InterfaceMetrics) -> u32 {
    let sc_points = match metrics.interface_sc {
        Some(sc) if sc > 50.0 => 1,
        _ => 0,
    };
    dg_points(metrics.dg_dsasa)
        + packstat_points(metrics.packstat)
        + buns_points(metrics.buns)
        + sc_points
}

pub fn assess(metrics: &InterfaceMetrics) -> InterfaceQuality {
    match quality_points(metrics) {
        8.. => InterfaceQuality::Excellent,
        6..=7 => InterfaceQuality::Good,
        4..=5 => InterfaceQuality::Fair,
        _ => InterfaceQuality::Poor,
    }
}

/// Returns the first bound the metrics violate, checked in the order
/// dG/dSASA, BUNS, packstat. Non-finite values always violate.
pub fn check_bounds(metrics: &InterfaceMetrics, bounds: &InterfaceBounds) -> Option<RejectionReason> {
    if !(metrics.dg_dsasa.is_finite() && metrics.dg_dsasa <= bounds.max_dg_dsasa) {
        return Some(RejectionReason::InterfaceOutOfBounds {
            metric: "dg_dsasa",
            value: metrics.dg_dsasa,
            bound: bounds.max_dg_dsasa,
        });
    }
    if !(metrics.buns.is_finite() && metrics.buns <= bounds.max_buns) {
        return Some(RejectionReason::InterfaceOutOfBounds {
            metric: "buns",
            value: metrics.buns,
            bound: bounds.max_buns,
        });
    }
    if !(metrics.packstat.is_finite() && metrics.packstat >= bounds.min_packstat) {
        return Some(RejectionReason::InterfaceOutOfBounds {
            metric: "packstat",
            value: metrics.packstat,
            bound: bounds.min_packstat,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(dg_dsasa: f64, packstat: f64, buns: f64, interface_sc: Option<f64>) -> InterfaceMetrics {
        InterfaceMetrics {
            dg_dsasa,
            packstat,
            buns,
            interface_sc,
        }
    }

    #[test]
    fn assess_grades_by_point_total() {
        assert_eq!(assess(&metrics(-12.0, 0.75, 1.0, Some(60.0))), InterfaceQuality::Excellent);
        assert_eq!(assess(&metrics(-12.0, 0.75, 1.0, None)), InterfaceQuality::Excellent);
        assert_eq!(assess(&metrics(-6.0, 0.6, 3.0, None)), InterfaceQuality::Good);
        assert_eq!(assess(&metrics(-2.0, 0.4, 3.0, None)), InterfaceQuality::Fair);
        assert_eq!(assess(&metrics(0.5, 0.2, 12.0, Some(10.0))), InterfaceQuality::Poor);
    }

    #[test]
    fn quality_points_uses_strict_thresholds() {
        assert_eq!(quality_points(&metrics(-10.0, 0.7, 2.0, Some(50.0))), 2 + 2 + 2);
    }

    #[test]
    fn check_bounds_accepts_metrics_within_defaults() {
        let bounds = InterfaceBounds::default();
        assert_eq!(check_bounds(&metrics(-0.5, 0.6, 5.0, None), &bounds), None);
    }

    #[test]
    fn check_bounds_reports_first_violation() {
        let bounds = InterfaceBounds::default();
        let reason = check_bounds(&metrics(1.0, 0.1, 9.0, None), &bounds).unwrap();
        assert!(matches!(
            reason,
            RejectionReason::InterfaceOutOfBounds {
                metric: "dg_dsasa",
                ..
            }
        ));
        let reason = check_bounds(&metrics(-3.0, 0.5, 2.0, None), &bounds).unwrap();
        assert!(matches!(
            reason,
            RejectionReason::InterfaceOutOfBounds {
                metric: "packstat",
                ..
            }
        ));
        let reason = check_bounds(&metrics(-3.0, 0.9, f64::NAN, None), &bounds).unwrap();
        assert!(matches!(
            reason,
            RejectionReason::InterfaceOutOfBounds { metric: "buns", .. }
        ));
    }
}
