// Race weekend listings
use serde::{Deserialize, Serialize};

/// One event (race weekend) in a season schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub round_number: u32,
    pub event_name: String,
    pub country: String,
    pub location: String,
    /// ISO date (YYYY-MM-DD), normalized by the provider adapter.
    pub event_date: String,
}
