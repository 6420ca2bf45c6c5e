//! Keyword-to-coordinate resolution against the station directory.
//!
//! Resolution is best-effort: a keyword that matches nothing, a record we
//! cannot pull coordinates out of, and a directory that is down all look the
//! same to the caller (`None`). One flaky lookup must never abort a whole
//! planning session.

use crate::models::ResolvedPlace;
use crate::normalize::{
    extract_coords, normalize_name, station_code, station_label, RawStationRecord,
};

/// Candidates requested from the directory per lookup.
pub const SEARCH_LIMIT: usize = 5;

/// External station-directory collaborator.
///
/// Implemented over HTTP in `hydroroute-client`; tests stub it.
#[allow(async_fn_in_trait)]
pub trait StationDirectory {
    type Error: std::fmt::Display;

    /// Search stations by free-text keyword, returning at most `limit`
    /// records in the directory's own ranking order.
    async fn search(
        &self,
        keyword: &str,
        limit: usize,
    ) -> Result<Vec<RawStationRecord>, Self::Error>;

    /// Fetch one station's detail record by code, if it exists.
    async fn detail_by_code(&self, code: &str) -> Result<Option<RawStationRecord>, Self::Error>;
}

/// Resolve a free-text keyword to a canonical label plus coordinates.
///
/// An exact (trimmed, case-insensitive) name match among the candidates wins;
/// otherwise the directory's first result is taken as-is, with no re-ranking.
/// If the chosen candidate has no extractable coordinates but carries a
/// station code, exactly one supplementary detail fetch is attempted. A
/// candidate that still yields nothing is a no-match; no other candidate is
/// tried.
pub async fn resolve<D: StationDirectory>(directory: &D, keyword: &str) -> Option<ResolvedPlace> {
    let trimmed = keyword.trim();
    if trimmed.is_empty() {
        return None;
    }

    let records = match directory.search(trimmed, SEARCH_LIMIT).await {
        Ok(records) => records,
        Err(err) => {
            tracing::debug!(keyword = trimmed, error = %err, "station search failed");
            return None;
        }
    };

    let wanted = normalize_name(trimmed);
    let matched = records
        .iter()
        .find(|record| normalize_name(station_label(record)) == wanted)
        .or_else(|| records.first())?;

    let name = station_label(matched).trim().to_string();
    if name.is_empty() {
        return None;
    }

    let mut coords = extract_coords(matched);
    if coords.is_none() {
        if let Some(code) = station_code(matched) {
            match directory.detail_by_code(&code).await {
                Ok(Some(detail)) => coords = extract_coords(&detail),
                Ok(None) => {}
                Err(err) => {
                    tracing::debug!(code, error = %err, "station detail fetch failed");
                }
            }
        }
    }

    coords.map(|coords| ResolvedPlace { name, coords })
}
