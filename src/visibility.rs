//! Visibility predicate.
//!
//! Pure functions of a cached [`Position`] and the current [`ViewportWindow`].
//! Nothing here queries layout.

use serde::{Deserialize, Serialize};

use crate::position::Position;
use crate::viewport::ViewportWindow;

/// How a cached position is compared against the viewport window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityRule {
    /// Visible when either edge lies inside the window (inclusive).
    ///
    /// An element taller than the viewport that spans it entirely has both
    /// edges outside, so it is only picked up once an edge scrolls in.
    #[default]
    Endpoint,
    /// Visible when the closed intervals intersect at all.
    Overlap,
}

/// Decide whether `position` is in view under `rule`.
///
/// Boundary contact counts as visible. Zero-height positions are handled by
/// the same comparison as any other.
pub fn is_visible(position: Position, window: ViewportWindow, rule: VisibilityRule) -> bool {
    match rule {
        VisibilityRule::Endpoint => {
            window.contains(position.top) || window.contains(position.bottom)
        }
        VisibilityRule::Overlap => {
            let (low, high) = position.ordered();
            low <= window.max && high >= window.min
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(top: f64, bottom: f64) -> Position {
        Position { top, bottom }
    }

    fn win(min: f64, max: f64) -> ViewportWindow {
        ViewportWindow { min, max }
    }

    #[test]
    fn test_below_fold_not_visible() {
        assert!(!is_visible(
            pos(500.0, 600.0),
            win(0.0, 400.0),
            VisibilityRule::Endpoint
        ));
    }

    #[test]
    fn test_top_inside_window() {
        assert!(is_visible(
            pos(500.0, 600.0),
            win(450.0, 850.0),
            VisibilityRule::Endpoint
        ));
    }

    #[test]
    fn test_bottom_inside_window() {
        assert!(is_visible(
            pos(-100.0, 20.0),
            win(0.0, 400.0),
            VisibilityRule::Endpoint
        ));
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let rule = VisibilityRule::Endpoint;
        assert!(is_visible(pos(400.0, 500.0), win(0.0, 400.0), rule));
        assert!(is_visible(pos(-50.0, 0.0), win(0.0, 400.0), rule));
        assert!(!is_visible(pos(400.5, 500.0), win(0.0, 400.0), rule));
    }

    #[test]
    fn test_zero_height() {
        let rule = VisibilityRule::Endpoint;
        assert!(is_visible(pos(200.0, 200.0), win(0.0, 400.0), rule));
        assert!(!is_visible(pos(401.0, 401.0), win(0.0, 400.0), rule));
        assert!(is_visible(pos(0.0, 0.0), win(0.0, 0.0), rule));
    }

    #[test]
    fn test_spanning_element_endpoint_vs_overlap() {
        let tall = pos(-100.0, 1000.0);
        let window = win(0.0, 400.0);
        assert!(!is_visible(tall, window, VisibilityRule::Endpoint));
        assert!(is_visible(tall, window, VisibilityRule::Overlap));
    }

    #[test]
    fn test_overlap_matches_endpoint_for_small_elements() {
        let window = win(100.0, 500.0);
        for top in (0..700).step_by(25) {
            let p = pos(top as f64, top as f64 + 50.0);
            assert_eq!(
                is_visible(p, window, VisibilityRule::Endpoint),
                is_visible(p, window, VisibilityRule::Overlap),
                "disagreement at top={top}"
            );
        }
    }

    #[test]
    fn test_widening_never_hides() {
        let samples = [
            pos(0.0, 0.0),
            pos(-30.0, 10.0),
            pos(390.0, 420.0),
            pos(500.0, 600.0),
            pos(-500.0, 2000.0),
        ];
        for rule in [VisibilityRule::Endpoint, VisibilityRule::Overlap] {
            for p in samples {
                let mut window = win(100.0, 300.0);
                let mut was_visible = is_visible(p, window, rule);
                for _ in 0..10 {
                    window = win(window.min - 50.0, window.max + 50.0);
                    let now_visible = is_visible(p, window, rule);
                    assert!(!was_visible || now_visible, "{p:?} hidden by widening");
                    was_visible = now_visible;
                }
            }
        }
    }

    #[test]
    fn test_rule_deserializes_lowercase() {
        let rule: VisibilityRule = serde_json::from_str("\"overlap\"").unwrap();
        assert_eq!(rule, VisibilityRule::Overlap);
    }
}
