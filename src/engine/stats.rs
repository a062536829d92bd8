//! Per-group statistics computation
//!
//! Pure derivation over a formed group: min/max/average of skill, latency,
//! and wait duration (formation time minus join time), plus the member
//! roster in name order. Nothing here is persisted; callers recompute on
//! request.

use crate::types::{Group, GroupStatistics};
use crate::utils::elapsed_seconds;

/// Running min/max/sum accumulator for one measurement
///
/// Minima start at infinity so a legitimate zero-valued sample is honored.
#[derive(Debug)]
struct Spread {
    min: f64,
    max: f64,
    sum: f64,
}

impl Spread {
    fn new() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
        }
    }

    fn observe(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value;
    }

    fn average(&self, count: usize) -> f64 {
        self.sum / count as f64
    }
}

/// Compute statistics for a formed group
///
/// An empty group yields the zeroed sentinel rather than dividing by zero;
/// formed groups always hold `group_size > 0` members.
pub fn calculate_group_stats(group: &Group) -> GroupStatistics {
    if group.is_empty() {
        return GroupStatistics::default();
    }

    let mut skill = Spread::new();
    let mut latency = Spread::new();
    let mut wait = Spread::new();
    let mut player_names = Vec::with_capacity(group.len());

    for member in group.members.values() {
        player_names.push(member.name.clone());
        skill.observe(member.skill);
        latency.observe(member.latency);
        wait.observe(elapsed_seconds(member.connected_at, group.formed_at));
    }

    let count = group.len();
    GroupStatistics {
        group_number: group.number,
        min_skill: skill.min,
        max_skill: skill.max,
        avg_skill: skill.average(count),
        min_latency: latency.min,
        max_latency: latency.max,
        avg_latency: latency.average(count),
        min_wait_seconds: wait.min,
        max_wait_seconds: wait.max,
        avg_wait_seconds: wait.average(count),
        player_names,
    }
}
