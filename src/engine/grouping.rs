//! Match engine implementation: pending queue and greedy group formation
//!
//! A recalculation replaces the queue wholesale from a pool snapshot,
//! discards every existing group, and forms new groups until fewer than
//! `group_size` candidates remain. The engine's write lock spans the whole
//! rebuild, so readers never observe a half-built batch and concurrent
//! rebuilds are serialized.

use crate::engine::stats::calculate_group_stats;
use crate::error::{MatchPoolError, Result};
use crate::types::{GamerName, GamerRecord, Group, GroupStatistics};
use crate::utils::current_timestamp;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use tracing::{debug, info};

/// Queue and group state owned exclusively by the engine
#[derive(Debug, Default)]
struct EngineState {
    queue: BTreeMap<GamerName, GamerRecord>,
    groups: Vec<Group>,
}

/// The matchmaking engine
///
/// `group_size` is fixed at construction for the engine's lifetime; multiple
/// independent engines can coexist.
#[derive(Debug)]
pub struct MatchEngine {
    group_size: usize,
    state: RwLock<EngineState>,
}

impl MatchEngine {
    /// Create an engine forming groups of `group_size` members
    pub fn new(group_size: usize) -> Self {
        Self {
            group_size,
            state: RwLock::new(EngineState::default()),
        }
    }

    /// Configured group size
    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// Rebuild all groups from a fresh pool snapshot
    ///
    /// Replaces the pending queue with the snapshot, discards every existing
    /// group, and runs the grouping pass. Candidates left below `group_size`
    /// stay in the queue only until the next call, which replaces it again.
    /// Returns the freshly formed groups. A zero group size or an empty
    /// snapshot forms no groups and is not an error.
    pub fn recalculate(&self, snapshot: HashMap<GamerName, GamerRecord>) -> Result<Vec<Group>> {
        let mut state = self.state.write().map_err(|_| MatchPoolError::Internal {
            message: "Failed to acquire engine write lock".to_string(),
        })?;

        let state = &mut *state;
        let candidates = snapshot.len();
        state.queue = snapshot.into_iter().collect();
        state.groups = Vec::new();

        form_groups(&mut state.queue, self.group_size, &mut state.groups);

        info!(
            "Recalculated groups: {} candidates -> {} groups of {}, {} left unassigned",
            candidates,
            state.groups.len(),
            self.group_size,
            state.queue.len()
        );

        Ok(state.groups.clone())
    }

    /// Currently formed groups, without recomputation
    pub fn get_groups(&self) -> Result<Vec<Group>> {
        let state = self.state.read().map_err(|_| MatchPoolError::Internal {
            message: "Failed to acquire engine read lock".to_string(),
        })?;

        Ok(state.groups.clone())
    }

    /// Number of candidates currently left unassigned
    pub fn unassigned(&self) -> Result<usize> {
        let state = self.state.read().map_err(|_| MatchPoolError::Internal {
            message: "Failed to acquire engine read lock".to_string(),
        })?;

        Ok(state.queue.len())
    }

    /// Statistics for the group at `index`
    ///
    /// An out-of-range index yields the zeroed sentinel, not an error.
    pub fn group_stats(&self, index: usize) -> Result<GroupStatistics> {
        let state = self.state.read().map_err(|_| MatchPoolError::Internal {
            message: "Failed to acquire engine read lock".to_string(),
        })?;

        match state.groups.get(index) {
            Some(group) => Ok(calculate_group_stats(group)),
            None => {
                debug!("Statistics requested for out-of-range group {}", index);
                Ok(GroupStatistics::default())
            }
        }
    }
}

/// Form groups from the queue until fewer than `group_size` candidates remain,
/// then renumber every group by its final position
fn form_groups(
    queue: &mut BTreeMap<GamerName, GamerRecord>,
    group_size: usize,
    groups: &mut Vec<Group>,
) {
    if group_size == 0 {
        return;
    }

    while queue.len() >= group_size {
        let mut members = BTreeMap::new();
        for _ in 0..group_size {
            let Some(name) = select_best_fit(queue) else {
                break;
            };
            if let Some(record) = queue.remove(&name) {
                members.insert(name, record);
            }
        }

        groups.push(Group {
            number: 0,
            members,
            formed_at: current_timestamp(),
        });
    }

    for (position, group) in groups.iter_mut().enumerate() {
        group.number = position;
    }
}

/// Greedy relative-improvement scan over the queue
///
/// The first candidate (name order) seeds the running best fit, collapsing
/// the running minima to zero; a later candidate displaces it only when its
/// skill- and latency-difference against the current best are both within
/// the minima observed so far. This is not a global nearest-neighbor search.
fn select_best_fit(queue: &BTreeMap<GamerName, GamerRecord>) -> Option<GamerName> {
    let mut min_skill_diff = f64::INFINITY;
    let mut min_latency_diff = f64::INFINITY;
    let mut best: Option<&GamerRecord> = None;

    for candidate in queue.values() {
        let current = match best {
            Some(record) => record,
            None => {
                best = Some(candidate);
                candidate
            }
        };

        let skill_diff = (candidate.skill - current.skill).abs();
        let latency_diff = (candidate.latency - current.latency).abs();
        if skill_diff <= min_skill_diff && latency_diff <= min_latency_diff {
            min_skill_diff = skill_diff;
            min_latency_diff = latency_diff;
            best = Some(candidate);
        }
    }

    best.map(|record| record.name.clone())
}
