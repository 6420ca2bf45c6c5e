//! Visiting-order suggestion for a stop list.
//!
//! Greedy nearest-neighbor chaining with a farthest-point terminal pick.
//! This is a cheap O(n²) heuristic over at most six resolved stops, not a
//! travelling-salesman solver; the suggested order is reasonable, never
//! provably optimal.

use crate::models::{LatLng, Stop};
use crate::spatial::angular_distance;
use serde::{Deserialize, Serialize};

/// Outcome of one sequencing attempt, for the caller to surface to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencerOutcome {
    /// Fewer than two stops: there is nothing to order yet.
    NeedStartAndEnd,
    /// The start has no position; it is never computed or substituted.
    StartUnresolved,
    /// No stop after the start has a position.
    NoResolvedDestinations,
    /// Reordered, but unresolved stops were excluded and appended at the end.
    OptimizedWithWarning,
    /// Every stop participated in the reordering.
    Optimized,
}

impl SequencerOutcome {
    /// Whether the returned list is a computed reordering (as opposed to the
    /// input handed back on a guard failure).
    pub fn is_reordered(&self) -> bool {
        matches!(
            self,
            SequencerOutcome::Optimized | SequencerOutcome::OptimizedWithWarning
        )
    }

    pub fn message(&self) -> &'static str {
        match self {
            SequencerOutcome::NeedStartAndEnd => "Enter a start and a destination first.",
            SequencerOutcome::StartUnresolved => "Confirm the start location first.",
            SequencerOutcome::NoResolvedDestinations => {
                "Confirm at least one destination location first."
            }
            SequencerOutcome::OptimizedWithWarning => {
                "Stops without coordinates were excluded from the suggested order."
            }
            SequencerOutcome::Optimized => "Stops reordered along the suggested route.",
        }
    }
}

/// A suggested visiting order plus how it was arrived at.
#[derive(Debug, Clone, Serialize)]
pub struct SequencedRoute {
    pub stops: Vec<Stop>,
    pub outcome: SequencerOutcome,
}

/// Compute a suggested visiting order over a stop list.
///
/// The start stays fixed. Among the resolved stops after it, the one farthest
/// from the start becomes the terminal; the rest are chained greedily by
/// nearest-unvisited-next starting from the start. Unresolved stops are
/// excluded from ordering and appended after the terminal in their input
/// order, so every input stop appears in the output exactly once. Guard
/// failures return the input untouched. Deterministic: ties keep the
/// first-encountered candidate.
pub fn compute_order(stops: &[Stop]) -> SequencedRoute {
    if stops.len() < 2 {
        return unchanged(stops, SequencerOutcome::NeedStartAndEnd);
    }
    let start = &stops[0];
    let Some(origin) = start.position else {
        return unchanged(stops, SequencerOutcome::StartUnresolved);
    };

    let mut with_position: Vec<(&Stop, LatLng)> = Vec::new();
    let mut without_position: Vec<&Stop> = Vec::new();
    for stop in &stops[1..] {
        match stop.position {
            Some(position) => with_position.push((stop, position)),
            None => without_position.push(stop),
        }
    }
    if with_position.is_empty() {
        return unchanged(stops, SequencerOutcome::NoResolvedDestinations);
    }

    // Terminal: the resolved stop farthest from the start.
    let mut terminal_index = 0;
    let mut max_distance = -1.0;
    for (index, (_, position)) in with_position.iter().enumerate() {
        let distance = angular_distance(origin, *position);
        if distance > max_distance {
            max_distance = distance;
            terminal_index = index;
        }
    }
    let (terminal, _) = with_position.remove(terminal_index);

    let mut ordered = Vec::with_capacity(stops.len());
    ordered.push(start.clone());

    // Chain the remaining resolved stops by nearest-unvisited-next.
    let mut current = origin;
    while !with_position.is_empty() {
        let mut best_index = 0;
        let mut best_distance = f64::INFINITY;
        for (index, (_, position)) in with_position.iter().enumerate() {
            let distance = angular_distance(current, *position);
            if distance < best_distance {
                best_distance = distance;
                best_index = index;
            }
        }
        let (stop, position) = with_position.remove(best_index);
        ordered.push(stop.clone());
        current = position;
    }

    ordered.push(terminal.clone());
    ordered.extend(without_position.iter().map(|stop| (*stop).clone()));

    let outcome = if without_position.is_empty() {
        SequencerOutcome::Optimized
    } else {
        SequencerOutcome::OptimizedWithWarning
    };
    SequencedRoute {
        stops: ordered,
        outcome,
    }
}

fn unchanged(stops: &[Stop], outcome: SequencerOutcome) -> SequencedRoute {
    SequencedRoute {
        stops: stops.to_vec(),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResolvedPlace;

    fn resolved(id: &str, lat: f64, lng: f64) -> Stop {
        let mut stop = Stop::new(id);
        stop.set_keyword(id);
        stop.apply_place(ResolvedPlace {
            name: id.to_string(),
            coords: LatLng::new(lat, lng),
        });
        stop
    }

    fn unresolved(id: &str, keyword: &str) -> Stop {
        let mut stop = Stop::new(id);
        stop.set_keyword(keyword);
        stop
    }

    fn ids(route: &SequencedRoute) -> Vec<&str> {
        route.stops.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn single_stop_needs_start_and_end() {
        let stops = vec![resolved("start", 0.0, 0.0)];
        let route = compute_order(&stops);
        assert_eq!(route.outcome, SequencerOutcome::NeedStartAndEnd);
        assert_eq!(ids(&route), ["start"]);
    }

    #[test]
    fn unresolved_start_is_rejected() {
        let stops = vec![unresolved("start", "어딘가"), resolved("end", 0.0, 1.0)];
        let route = compute_order(&stops);
        assert_eq!(route.outcome, SequencerOutcome::StartUnresolved);
        assert_eq!(ids(&route), ["start", "end"]);
    }

    #[test]
    fn no_resolved_destinations_is_rejected() {
        let stops = vec![resolved("start", 0.0, 0.0), unresolved("end", "어딘가")];
        let route = compute_order(&stops);
        assert_eq!(route.outcome, SequencerOutcome::NoResolvedDestinations);
        assert_eq!(ids(&route), ["start", "end"]);
    }

    #[test]
    fn farthest_stop_becomes_terminal_and_rest_chain_nearest_first() {
        let stops = vec![
            resolved("start", 0.0, 0.0),
            resolved("a", 0.0, 1.0),
            resolved("b", 0.0, 5.0),
            resolved("c", 0.0, 2.0),
        ];
        let route = compute_order(&stops);
        assert_eq!(route.outcome, SequencerOutcome::Optimized);
        assert_eq!(ids(&route), ["start", "a", "c", "b"]);
    }

    #[test]
    fn output_is_a_permutation_and_deterministic() {
        let stops = vec![
            resolved("start", 35.10, 129.03),
            resolved("m1", 35.16, 129.16),
            resolved("m2", 35.23, 129.08),
            resolved("end", 35.15, 129.11),
        ];
        let first = compute_order(&stops);
        let second = compute_order(&stops);
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first.stops.len(), stops.len());
        for stop in &stops {
            assert_eq!(
                first.stops.iter().filter(|s| s.id == stop.id).count(),
                1,
                "stop {} must appear exactly once",
                stop.id
            );
        }
        assert_eq!(first.stops[0].id, "start");
    }

    #[test]
    fn unresolved_stops_are_appended_after_the_terminal() {
        let stops = vec![
            resolved("start", 0.0, 0.0),
            resolved("m1", 0.0, 1.0),
            unresolved("m2", "좌표 없는 경유지"),
            resolved("end", 0.0, 3.0),
        ];
        let route = compute_order(&stops);
        assert_eq!(route.outcome, SequencerOutcome::OptimizedWithWarning);
        assert_eq!(ids(&route), ["start", "m1", "end", "m2"]);
    }

    #[test]
    fn terminal_tie_keeps_first_encountered() {
        let stops = vec![
            resolved("start", 0.0, 0.0),
            resolved("a", 0.0, 2.0),
            resolved("b", 0.0, -2.0),
        ];
        let route = compute_order(&stops);
        // Equal distance from start: "a" was seen first, so it is the terminal.
        assert_eq!(ids(&route), ["start", "b", "a"]);
    }

    #[test]
    fn two_resolved_stops_are_start_then_terminal() {
        let stops = vec![resolved("start", 0.0, 0.0), resolved("end", 0.0, 1.0)];
        let route = compute_order(&stops);
        assert_eq!(route.outcome, SequencerOutcome::Optimized);
        assert_eq!(ids(&route), ["start", "end"]);
    }
}
