//! Common types used throughout the matchmaking service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique identifier for gamers within the pool
pub type GamerName = String;

/// A player waiting for a match, identified by name
///
/// `connected_at` is stamped when the record enters the system and is only
/// used to compute wait durations at group-formation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamerRecord {
    pub name: GamerName,
    pub skill: f64,
    pub latency: f64,
    pub connected_at: DateTime<Utc>,
}

impl GamerRecord {
    /// Create a record stamped with the current time
    pub fn new(name: impl Into<GamerName>, skill: f64, latency: f64) -> Self {
        Self {
            name: name.into(),
            skill,
            latency,
            connected_at: crate::utils::current_timestamp(),
        }
    }
}

/// A fixed-size batch of gamers selected to play together
///
/// `number` is the group's position in the current batch, reassigned after
/// every recalculation. Membership is keyed by name; iteration is in name
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub number: usize,
    pub members: BTreeMap<GamerName, GamerRecord>,
    pub formed_at: DateTime<Utc>,
}

impl Group {
    /// Number of members in the group
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Derived per-group report: skill, latency, and wait-duration spread
///
/// Wait durations are reported in seconds. The default value doubles as the
/// out-of-range sentinel: a zero `group_number` together with an empty
/// `player_names` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupStatistics {
    pub group_number: usize,
    pub min_skill: f64,
    pub max_skill: f64,
    pub avg_skill: f64,
    pub min_latency: f64,
    pub max_latency: f64,
    pub avg_latency: f64,
    pub min_wait_seconds: f64,
    pub max_wait_seconds: f64,
    pub avg_wait_seconds: f64,
    pub player_names: Vec<GamerName>,
}
