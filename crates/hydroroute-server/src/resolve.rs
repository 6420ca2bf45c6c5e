//! Background stop resolution.

use std::sync::Arc;

use hydroroute_core::resolver;

use crate::state::{AppState, ResolveRequest};

/// Spawn the resolution pass for one stop.
///
/// The task runs lookups until the stop's keyword stops moving: a completion
/// whose keyword is already stale is discarded by the store, which then hands
/// back a follow-up pass for the current keyword.
pub fn spawn_resolution(state: Arc<AppState>, request: ResolveRequest) {
    tokio::spawn(async move {
        let mut request = request;
        loop {
            let place = resolver::resolve(state.directory(), &request.keyword).await;
            tracing::debug!(
                session = %request.session_id,
                stop = %request.stop_id,
                keyword = %request.keyword,
                resolved = place.is_some(),
                "stop resolution completed"
            );
            match state.apply_resolution(&request, place) {
                Some(follow_up) => request = follow_up,
                None => break,
            }
        }
    });
}
