pub mod models;
pub mod normalize;
pub mod resolver;
pub mod sequencer;
pub mod spatial;

pub use models::{
    LatLng, ResolvedPlace, Stop, StopList, StopListError, END_STOP_ID, MAX_STOPS, START_STOP_ID,
};
pub use normalize::{extract_coords, orient_axes, RawStationRecord};
pub use resolver::{resolve, StationDirectory, SEARCH_LIMIT};
pub use sequencer::{compute_order, SequencedRoute, SequencerOutcome};
pub use spatial::{angular_distance, haversine_distance_m};
