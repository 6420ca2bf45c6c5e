//! In-memory session store using DashMap.
//!
//! All stop mutations run under the session's map entry, so concurrent
//! resolution completions and user edits stay per-stop atomic: read the
//! current stop, check, write back. Nothing ever overwrites a whole session
//! list from a stale snapshot.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use hydroroute_client::StationClient;
use hydroroute_core::models::{ResolvedPlace, Stop, StopList, StopListError};
use hydroroute_core::sequencer::{compute_order, SequencedRoute};
use serde::Serialize;
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("unknown session")]
    UnknownSession,
    #[error(transparent)]
    Stops(#[from] StopListError),
}

/// One transient route-planning session. Dropped with the session; nothing
/// is persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSession {
    pub session_id: String,
    pub stops: StopList,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlanSession {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            stops: StopList::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A resolution pass the caller should run for one stop.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveRequest {
    pub session_id: String,
    pub stop_id: String,
    pub keyword: String,
}

/// Application state: sessions plus the in-flight resolution markers that
/// deduplicate lookups per stop.
pub struct AppState {
    sessions: DashMap<String, PlanSession>,
    /// (session, stop) -> most recently requested keyword. Presence means a
    /// lookup is in flight for that stop.
    resolving: DashMap<(String, String), String>,
    directory: StationClient,
    config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let directory = StationClient::new(config.api_base_url.clone(), config.geocode_key.clone());
        Self {
            sessions: DashMap::new(),
            resolving: DashMap::new(),
            directory,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn directory(&self) -> &StationClient {
        &self.directory
    }

    // === Session lifecycle ===

    pub fn create_session(&self) -> PlanSession {
        let session = PlanSession::new();
        self.sessions
            .insert(session.session_id.clone(), session.clone());
        session
    }

    pub fn get_session(&self, session_id: &str) -> Option<PlanSession> {
        self.sessions.get(session_id).map(|s| s.clone())
    }

    pub fn drop_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            self.resolving.retain(|(sid, _), _| sid != session_id);
        }
        removed
    }

    // === Stop-list edits ===

    pub fn add_stop(&self, session_id: &str) -> Result<PlanSession, SessionError> {
        let mut session = self
            .sessions
            .get_mut(session_id)
            .ok_or(SessionError::UnknownSession)?;
        let stop = Stop::new(format!("stop-{}", uuid::Uuid::new_v4()));
        session.stops.insert_before_end(stop)?;
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    pub fn remove_stop(&self, session_id: &str, stop_id: &str) -> Result<PlanSession, SessionError> {
        let mut session = self
            .sessions
            .get_mut(session_id)
            .ok_or(SessionError::UnknownSession)?;
        session.stops.remove(stop_id)?;
        session.updated_at = Utc::now();
        let session = session.clone();
        self.resolving
            .remove(&(session_id.to_string(), stop_id.to_string()));
        Ok(session)
    }

    pub fn reorder_stops(
        &self,
        session_id: &str,
        order: &[String],
    ) -> Result<PlanSession, SessionError> {
        let mut session = self
            .sessions
            .get_mut(session_id)
            .ok_or(SessionError::UnknownSession)?;
        session.stops.reorder(order)?;
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    /// Update a stop's keyword (clearing its resolution) and, when the stop
    /// needs one and none is in flight, hand back a resolution pass to run.
    pub fn set_stop_keyword(
        &self,
        session_id: &str,
        stop_id: &str,
        keyword: &str,
    ) -> Result<(PlanSession, Option<ResolveRequest>), SessionError> {
        let mut session = self
            .sessions
            .get_mut(session_id)
            .ok_or(SessionError::UnknownSession)?;
        session.stops.set_keyword(stop_id, keyword)?;
        session.updated_at = Utc::now();
        let session = session.clone();
        let request = self.request_resolution(session_id, stop_id, keyword);
        Ok((session, request))
    }

    /// Apply a picked suggestion: keyword, label, and position as one unit.
    pub fn apply_suggestion(
        &self,
        session_id: &str,
        stop_id: &str,
        place: ResolvedPlace,
    ) -> Result<PlanSession, SessionError> {
        let mut session = self
            .sessions
            .get_mut(session_id)
            .ok_or(SessionError::UnknownSession)?;
        session.stops.set_keyword(stop_id, &place.name)?;
        let keyword = place.name.clone();
        session.stops.apply_resolution(stop_id, &keyword, Some(place));
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    // === Resolution plumbing ===

    fn request_resolution(
        &self,
        session_id: &str,
        stop_id: &str,
        keyword: &str,
    ) -> Option<ResolveRequest> {
        let trimmed = keyword.trim();
        if trimmed.is_empty() {
            return None;
        }
        match self
            .resolving
            .entry((session_id.to_string(), stop_id.to_string()))
        {
            Entry::Occupied(mut entry) => {
                // A lookup is already running; it will pick this keyword up
                // as a follow-up pass when it completes.
                entry.insert(keyword.to_string());
                None
            }
            Entry::Vacant(entry) => {
                entry.insert(keyword.to_string());
                Some(ResolveRequest {
                    session_id: session_id.to_string(),
                    stop_id: stop_id.to_string(),
                    keyword: keyword.to_string(),
                })
            }
        }
    }

    /// Record a completed lookup. The result only lands if the stop's
    /// keyword still matches the one the lookup was issued for; otherwise it
    /// is discarded (last keyword wins). Returns a follow-up pass when the
    /// keyword moved on while the lookup was in flight.
    pub fn apply_resolution(
        &self,
        request: &ResolveRequest,
        place: Option<ResolvedPlace>,
    ) -> Option<ResolveRequest> {
        if let Some(mut session) = self.sessions.get_mut(&request.session_id) {
            let applied =
                session
                    .stops
                    .apply_resolution(&request.stop_id, &request.keyword, place);
            if applied {
                session.updated_at = Utc::now();
            }
        }

        let key = (request.session_id.clone(), request.stop_id.clone());
        let (_, latest) = self.resolving.remove(&key)?;
        if latest != request.keyword {
            return self.request_resolution(&request.session_id, &request.stop_id, &latest);
        }
        None
    }

    // === Sequencing ===

    /// Run the sequencer over the session's stops. A successful reordering
    /// replaces the session's list; guard outcomes leave it untouched.
    pub fn optimize(&self, session_id: &str) -> Result<SequencedRoute, SessionError> {
        let mut session = self
            .sessions
            .get_mut(session_id)
            .ok_or(SessionError::UnknownSession)?;
        let route = compute_order(session.stops.stops());
        if route.outcome.is_reordered() {
            session.stops.replace_all(route.stops.clone());
            session.updated_at = Utc::now();
        }
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydroroute_core::models::{LatLng, END_STOP_ID, START_STOP_ID};
    use hydroroute_core::sequencer::SequencerOutcome;

    fn state() -> AppState {
        AppState::new(Config {
            server_port: 0,
            api_base_url: "http://localhost:59999".to_string(),
            geocode_key: None,
        })
    }

    fn place(name: &str, lat: f64, lng: f64) -> ResolvedPlace {
        ResolvedPlace {
            name: name.to_string(),
            coords: LatLng::new(lat, lng),
        }
    }

    #[test]
    fn keyword_update_requests_one_resolution_pass() {
        let state = state();
        let session = state.create_session();
        let (_, request) = state
            .set_stop_keyword(&session.session_id, START_STOP_ID, "해운대 관측소")
            .unwrap();
        let request = request.expect("first keyword starts a pass");
        assert_eq!(request.keyword, "해운대 관측소");

        // Second edit while the first pass is in flight: no new pass yet.
        let (_, second) = state
            .set_stop_keyword(&session.session_id, START_STOP_ID, "광안리")
            .unwrap();
        assert!(second.is_none());

        // The stale completion is discarded and chains a pass for the new
        // keyword.
        let follow_up = state.apply_resolution(&request, Some(place("해운대 관측소", 35.17, 129.07)));
        let follow_up = follow_up.expect("keyword changed, so a follow-up runs");
        assert_eq!(follow_up.keyword, "광안리");

        let session = state.get_session(&session.session_id).unwrap();
        let start = session.stops.get(START_STOP_ID).unwrap();
        assert_eq!(start.keyword, "광안리");
        assert!(start.position.is_none());
    }

    #[test]
    fn current_resolution_lands_and_clears_the_marker() {
        let state = state();
        let session = state.create_session();
        let (_, request) = state
            .set_stop_keyword(&session.session_id, END_STOP_ID, "해운대 관측소")
            .unwrap();
        let request = request.unwrap();
        assert!(state
            .apply_resolution(&request, Some(place("해운대 관측소", 35.17, 129.07)))
            .is_none());

        let session = state.get_session(&session.session_id).unwrap();
        let end = session.stops.get(END_STOP_ID).unwrap();
        assert_eq!(end.resolved_name.as_deref(), Some("해운대 관측소"));

        // Marker cleared: the next keyword starts a fresh pass immediately.
        let (_, next) = state
            .set_stop_keyword(&session.session_id, END_STOP_ID, "광안리")
            .unwrap();
        assert!(next.is_some());
    }

    #[test]
    fn blank_keyword_does_not_start_a_pass() {
        let state = state();
        let session = state.create_session();
        let (_, request) = state
            .set_stop_keyword(&session.session_id, END_STOP_ID, "   ")
            .unwrap();
        assert!(request.is_none());
    }

    #[test]
    fn optimize_replaces_stops_only_on_success() {
        let state = state();
        let session = state.create_session();
        let id = &session.session_id;

        // Start unresolved: guard outcome, list untouched.
        let route = state.optimize(id).unwrap();
        assert_eq!(route.outcome, SequencerOutcome::StartUnresolved);

        state.apply_suggestion(id, START_STOP_ID, place("출발", 0.0, 0.0)).unwrap();
        state.apply_suggestion(id, END_STOP_ID, place("도착", 0.0, 5.0)).unwrap();
        let added = state.add_stop(id).unwrap();
        let middle_id = added.stops.stops()[1].id.clone();
        state.apply_suggestion(id, &middle_id, place("경유", 0.0, 1.0)).unwrap();

        let route = state.optimize(id).unwrap();
        assert_eq!(route.outcome, SequencerOutcome::Optimized);
        let ids: Vec<&str> = route.stops.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, [START_STOP_ID, middle_id.as_str(), END_STOP_ID]);

        let stored = state.get_session(id).unwrap();
        assert_eq!(stored.stops.stops()[1].id, middle_id);
    }

    #[test]
    fn dropping_a_session_clears_its_markers() {
        let state = state();
        let session = state.create_session();
        state
            .set_stop_keyword(&session.session_id, END_STOP_ID, "해운대")
            .unwrap();
        assert!(state.drop_session(&session.session_id));
        assert!(!state.drop_session(&session.session_id));
        assert!(state.resolving.is_empty());
    }
}
