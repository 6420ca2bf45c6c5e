//! Core data models for a route-planning session over observation stations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum stops in one planning session: 1 start + up to 5 middle + 1 end.
pub const MAX_STOPS: usize = 7;

/// Fixed id of the designated start stop.
pub const START_STOP_ID: &str = "start";

/// Fixed id of the designated end stop.
pub const END_STOP_ID: &str = "end";

/// A geographic point in decimal degrees, WGS84.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are finite and within coordinate range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Result of resolving a keyword: canonical label plus coordinates.
///
/// Name and coordinates only ever travel together; a stop is never given one
/// without the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlace {
    pub name: String,
    pub coords: LatLng,
}

/// One waypoint in a planning session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub id: String,
    pub keyword: String,
    #[serde(default)]
    pub resolved_name: Option<String>,
    #[serde(default)]
    pub position: Option<LatLng>,
}

impl Stop {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            keyword: String::new(),
            resolved_name: None,
            position: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.position.is_some()
    }

    /// Replace the keyword, dropping any prior resolution as a unit.
    pub fn set_keyword(&mut self, keyword: impl Into<String>) {
        self.keyword = keyword.into();
        self.resolved_name = None;
        self.position = None;
    }

    /// Attach a resolution result: label and position set together.
    pub fn apply_place(&mut self, place: ResolvedPlace) {
        self.resolved_name = Some(place.name);
        self.position = Some(place.coords);
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StopListError {
    #[error("stop list is full ({MAX_STOPS} stops max)")]
    Full,
    #[error("the start and end stops cannot be removed")]
    FixedStop,
    #[error("unknown stop id {0}")]
    UnknownStop(String),
    #[error("reorder must be a permutation keeping the start first and the end last")]
    InvalidOrder,
}

/// Ordered stop sequence with the start pinned first and the end pinned last.
///
/// All mutation goes through these operations so the role invariant and the
/// resolution-as-a-unit invariant cannot be violated from outside.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StopList {
    stops: Vec<Stop>,
}

impl Default for StopList {
    fn default() -> Self {
        Self::new()
    }
}

impl StopList {
    /// A fresh session: empty start and end stops.
    pub fn new() -> Self {
        Self {
            stops: vec![Stop::new(START_STOP_ID), Stop::new(END_STOP_ID)],
        }
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Stop> {
        self.stops.iter().find(|stop| stop.id == id)
    }

    /// Insert a middle stop just before the end stop.
    pub fn insert_before_end(&mut self, stop: Stop) -> Result<(), StopListError> {
        if self.stops.len() >= MAX_STOPS {
            return Err(StopListError::Full);
        }
        let index = self.stops.len() - 1;
        self.stops.insert(index, stop);
        Ok(())
    }

    /// Remove a middle stop. The start and end stops are not removable.
    pub fn remove(&mut self, id: &str) -> Result<Stop, StopListError> {
        let index = self
            .stops
            .iter()
            .position(|stop| stop.id == id)
            .ok_or_else(|| StopListError::UnknownStop(id.to_string()))?;
        if index == 0 || index == self.stops.len() - 1 {
            return Err(StopListError::FixedStop);
        }
        Ok(self.stops.remove(index))
    }

    /// Rearrange stops to the given id order. The order must contain exactly
    /// the current ids, with the start first and the end last.
    pub fn reorder(&mut self, ids: &[String]) -> Result<(), StopListError> {
        if ids.len() != self.stops.len() {
            return Err(StopListError::InvalidOrder);
        }
        match (ids.first(), ids.last(), self.stops.first(), self.stops.last()) {
            (Some(first), Some(last), Some(start), Some(end))
                if *first == start.id && *last == end.id => {}
            _ => return Err(StopListError::InvalidOrder),
        }

        // Validate before touching the list so a bad order leaves it intact.
        let mut used = vec![false; self.stops.len()];
        let mut indices = Vec::with_capacity(ids.len());
        for id in ids {
            let index = self
                .stops
                .iter()
                .enumerate()
                .position(|(i, stop)| !used[i] && stop.id == *id)
                .ok_or(StopListError::InvalidOrder)?;
            used[index] = true;
            indices.push(index);
        }
        self.stops = indices.into_iter().map(|i| self.stops[i].clone()).collect();
        Ok(())
    }

    /// Update a stop's keyword, clearing its resolution.
    pub fn set_keyword(&mut self, id: &str, keyword: &str) -> Result<(), StopListError> {
        let stop = self
            .stops
            .iter_mut()
            .find(|stop| stop.id == id)
            .ok_or_else(|| StopListError::UnknownStop(id.to_string()))?;
        stop.set_keyword(keyword);
        Ok(())
    }

    /// Apply the result of an asynchronous resolution.
    ///
    /// `requested_keyword` is the keyword the lookup was issued for. If the
    /// stop's keyword has changed in the meantime the result is stale and is
    /// discarded (last keyword wins). Returns whether the stop was updated.
    pub fn apply_resolution(
        &mut self,
        id: &str,
        requested_keyword: &str,
        place: Option<ResolvedPlace>,
    ) -> bool {
        let Some(stop) = self.stops.iter_mut().find(|stop| stop.id == id) else {
            return false;
        };
        if stop.keyword != requested_keyword {
            return false;
        }
        match place {
            Some(place) => {
                stop.apply_place(place);
                true
            }
            None => false,
        }
    }

    /// Replace the sequence wholesale (sequencer output). The caller must
    /// hand back a permutation of the current stops.
    pub fn replace_all(&mut self, stops: Vec<Stop>) {
        debug_assert_eq!(stops.len(), self.stops.len());
        self.stops = stops;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(name: &str, lat: f64, lng: f64) -> ResolvedPlace {
        ResolvedPlace {
            name: name.to_string(),
            coords: LatLng::new(lat, lng),
        }
    }

    #[test]
    fn new_list_has_fixed_start_and_end() {
        let list = StopList::new();
        assert_eq!(list.len(), 2);
        assert_eq!(list.stops()[0].id, START_STOP_ID);
        assert_eq!(list.stops()[1].id, END_STOP_ID);
    }

    #[test]
    fn keyword_change_clears_resolution_as_a_unit() {
        let mut stop = Stop::new("s1");
        stop.set_keyword("해운대 관측소");
        stop.apply_place(place("해운대 관측소", 35.1796, 129.0756));
        assert!(stop.is_resolved());

        stop.set_keyword("광안리");
        assert!(stop.resolved_name.is_none());
        assert!(stop.position.is_none());
    }

    #[test]
    fn insert_respects_max_stops() {
        let mut list = StopList::new();
        for i in 0..5 {
            list.insert_before_end(Stop::new(format!("m{i}"))).unwrap();
        }
        assert_eq!(list.len(), MAX_STOPS);
        assert_eq!(
            list.insert_before_end(Stop::new("overflow")),
            Err(StopListError::Full)
        );
        // End stays last after inserts.
        assert_eq!(list.stops().last().unwrap().id, END_STOP_ID);
    }

    #[test]
    fn start_and_end_are_not_removable() {
        let mut list = StopList::new();
        list.insert_before_end(Stop::new("m0")).unwrap();
        assert_eq!(list.remove(START_STOP_ID), Err(StopListError::FixedStop));
        assert_eq!(list.remove(END_STOP_ID), Err(StopListError::FixedStop));
        assert!(list.remove("m0").is_ok());
        assert_eq!(
            list.remove("m0"),
            Err(StopListError::UnknownStop("m0".to_string()))
        );
    }

    #[test]
    fn reorder_keeps_roles_pinned() {
        let mut list = StopList::new();
        list.insert_before_end(Stop::new("a")).unwrap();
        list.insert_before_end(Stop::new("b")).unwrap();

        let order: Vec<String> = ["start", "b", "a", "end"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        list.reorder(&order).unwrap();
        let ids: Vec<&str> = list.stops().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["start", "b", "a", "end"]);

        let bad: Vec<String> = ["b", "start", "a", "end"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(list.reorder(&bad), Err(StopListError::InvalidOrder));
    }

    #[test]
    fn stale_resolution_is_discarded() {
        let mut list = StopList::new();
        list.set_keyword(START_STOP_ID, "해운대 관측소").unwrap();

        // Keyword changes while the lookup for the old keyword is in flight.
        list.set_keyword(START_STOP_ID, "광안리").unwrap();

        let applied = list.apply_resolution(
            START_STOP_ID,
            "해운대 관측소",
            Some(place("해운대 관측소", 35.1796, 129.0756)),
        );
        assert!(!applied);
        let start = list.get(START_STOP_ID).unwrap();
        assert_eq!(start.keyword, "광안리");
        assert!(start.position.is_none());
    }

    #[test]
    fn current_resolution_applies() {
        let mut list = StopList::new();
        list.set_keyword(END_STOP_ID, "해운대 관측소").unwrap();
        let applied = list.apply_resolution(
            END_STOP_ID,
            "해운대 관측소",
            Some(place("해운대 관측소", 35.1796, 129.0756)),
        );
        assert!(applied);
        let end = list.get(END_STOP_ID).unwrap();
        assert_eq!(end.resolved_name.as_deref(), Some("해운대 관측소"));
        assert_eq!(end.position, Some(LatLng::new(35.1796, 129.0756)));
    }

    #[test]
    fn no_match_resolution_leaves_stop_unresolved() {
        let mut list = StopList::new();
        list.set_keyword(END_STOP_ID, "없는 지점").unwrap();
        assert!(!list.apply_resolution(END_STOP_ID, "없는 지점", None));
        assert!(!list.get(END_STOP_ID).unwrap().is_resolved());
    }
}
