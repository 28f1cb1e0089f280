// Session identity and metadata
use std::fmt;

/// Identifies one session: season year, round number and session type
/// ('R', 'S', 'Q', 'SQ'). Doubles as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub year: i32,
    pub round: u32,
    pub session_type: String,
}

impl SessionKey {
    pub fn new(year: i32, round: u32, session_type: impl Into<String>) -> Self {
        Self {
            year,
            round,
            session_type: session_type.into().to_uppercase(),
        }
    }

    /// File name for a cached artifact of the given kind.
    pub fn artifact_name(&self, kind: &str) -> String {
        format!("{}_{}_{}_{}.json", kind, self.year, self.round, self.session_type)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} round {} ({})", self.year, self.round, self.session_type)
    }
}

#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub event_name: String,
    pub total_laps: u32,
}
