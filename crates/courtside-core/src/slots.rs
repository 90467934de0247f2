// Slot assignment: placing eight selected candidates into the named roster
// slots.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::pool::Candidate;
use crate::position::{EligibilityFlags, Slot, ROSTER_SIZE};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SlotAssignmentError {
    #[error("expected 8 selected candidates, got {count}")]
    WrongSelectionSize { count: usize },

    #[error("no eligible candidate left for slot {slot}")]
    Unfillable { slot: Slot },

    #[error("invalid slot assignment: {detail}")]
    Invalid { detail: String },

    #[error("slot priority must list all 8 slots once, got {priority:?}")]
    InvalidPriority { priority: Vec<Slot> },
}

/// A candidate placed in a roster slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotAssignment {
    pub slot: Slot,
    pub candidate: Candidate,
}

/// A complete roster: eight slot assignments in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lineup {
    /// Strategy label the lineup was built under.
    pub label: String,
    pub slots: Vec<SlotAssignment>,
}

impl Lineup {
    pub fn new(label: impl Into<String>, mut slots: Vec<SlotAssignment>) -> Self {
        slots.sort_by_key(|a| a.slot.sort_order());
        Lineup {
            label: label.into(),
            slots,
        }
    }

    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.slots.iter().map(|a| &a.candidate)
    }

    pub fn total_cost(&self) -> f64 {
        self.candidates().map(|c| c.cost).sum()
    }

    pub fn total_value(&self) -> f64 {
        self.candidates().map(|c| c.projected_value).sum()
    }

    pub fn keys(&self) -> HashSet<String> {
        self.candidates().map(|c| c.key.clone()).collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.candidates().any(|c| c.key == key)
    }

    /// Number of candidates this lineup shares with `other`.
    pub fn shared_with(&self, other: &Lineup) -> usize {
        self.candidates().filter(|c| other.contains(&c.key)).count()
    }

    pub fn occupant(&self, slot: Slot) -> Option<&Candidate> {
        self.slots
            .iter()
            .find(|a| a.slot == slot)
            .map(|a| &a.candidate)
    }
}

// ---------------------------------------------------------------------------
// Feasibility check
// ---------------------------------------------------------------------------

/// Whether the given eligibility flags admit a complete assignment of the
/// eight slots (one candidate per slot, every slot filled).
pub fn assignment_exists(flags: &[EligibilityFlags]) -> bool {
    if flags.len() != ROSTER_SIZE {
        return false;
    }
    fill_slot(flags, 0, 0)
}

fn fill_slot(flags: &[EligibilityFlags], slot_index: usize, used: u16) -> bool {
    let Some(slot) = Slot::ALL.get(slot_index) else {
        return true;
    };
    flags.iter().enumerate().any(|(i, f)| {
        used & (1 << i) == 0 && slot.accepts(f) && fill_slot(flags, slot_index + 1, used | (1 << i))
    })
}

// ---------------------------------------------------------------------------
// Assigner
// ---------------------------------------------------------------------------

/// Greedy slot assigner with a configurable fill order.
#[derive(Debug, Clone)]
pub struct SlotAssigner {
    priority: Vec<Slot>,
}

impl Default for SlotAssigner {
    fn default() -> Self {
        SlotAssigner {
            priority: Slot::ALL.to_vec(),
        }
    }
}

impl SlotAssigner {
    /// Build an assigner that fills slots in `priority` order. The list must
    /// name each of the eight slots exactly once.
    pub fn new(priority: Vec<Slot>) -> Result<Self, SlotAssignmentError> {
        let distinct: HashSet<Slot> = priority.iter().copied().collect();
        if priority.len() != ROSTER_SIZE || distinct.len() != ROSTER_SIZE {
            return Err(SlotAssignmentError::InvalidPriority { priority });
        }
        Ok(SlotAssigner { priority })
    }

    pub fn priority(&self) -> &[Slot] {
        &self.priority
    }

    /// Place the selection into slots.
    ///
    /// Each slot takes the best remaining eligible candidate. Base slots
    /// prefer candidates that cannot play the sibling base slot. When the
    /// greedy pass dead-ends, an exhaustive search in the same slot order
    /// takes over.
    pub fn assign(&self, selection: &[Candidate]) -> Result<Vec<SlotAssignment>, SlotAssignmentError> {
        if selection.len() != ROSTER_SIZE {
            return Err(SlotAssignmentError::WrongSelectionSize {
                count: selection.len(),
            });
        }
        let flags: Vec<EligibilityFlags> = selection.iter().map(Candidate::eligibility).collect();

        let placement = match self.greedy(selection, &flags) {
            Ok(placement) => placement,
            Err(slot) => {
                debug!("greedy slot fill stuck at {slot}, falling back to exhaustive search");
                let mut placement = Vec::with_capacity(ROSTER_SIZE);
                if !self.backtrack(selection, &flags, &mut placement, 0) {
                    return Err(SlotAssignmentError::Unfillable { slot });
                }
                placement
            }
        };

        let assignments: Vec<SlotAssignment> = placement
            .into_iter()
            .map(|(slot, idx)| SlotAssignment {
                slot,
                candidate: selection[idx].clone(),
            })
            .collect();
        validate_assignment(&assignments)?;
        Ok(assignments)
    }

    /// Assign and wrap the result into a `Lineup`.
    pub fn build_lineup(
        &self,
        label: impl Into<String>,
        selection: &[Candidate],
    ) -> Result<Lineup, SlotAssignmentError> {
        Ok(Lineup::new(label, self.assign(selection)?))
    }

    fn greedy(
        &self,
        selection: &[Candidate],
        flags: &[EligibilityFlags],
    ) -> Result<Vec<(Slot, usize)>, Slot> {
        let mut used = vec![false; selection.len()];
        let mut placement = Vec::with_capacity(ROSTER_SIZE);
        for &slot in &self.priority {
            let best = ranked_for_slot(slot, selection, flags)
                .into_iter()
                .find(|&i| !used[i])
                .ok_or(slot)?;
            used[best] = true;
            placement.push((slot, best));
        }
        Ok(placement)
    }

    fn backtrack(
        &self,
        selection: &[Candidate],
        flags: &[EligibilityFlags],
        placement: &mut Vec<(Slot, usize)>,
        depth: usize,
    ) -> bool {
        let Some(&slot) = self.priority.get(depth) else {
            return true;
        };
        for idx in ranked_for_slot(slot, selection, flags) {
            if placement.iter().any(|&(_, used)| used == idx) {
                continue;
            }
            placement.push((slot, idx));
            if self.backtrack(selection, flags, placement, depth + 1) {
                return true;
            }
            placement.pop();
        }
        false
    }
}

/// Indices of candidates eligible for `slot`, best first.
fn ranked_for_slot(slot: Slot, selection: &[Candidate], flags: &[EligibilityFlags]) -> Vec<usize> {
    let mut eligible: Vec<usize> = (0..selection.len())
        .filter(|&i| slot.accepts(&flags[i]))
        .collect();
    let sibling = slot.sibling();
    eligible.sort_by(|&a, &b| {
        let sibling_eligible = |i: usize| sibling.is_some_and(|s| s.accepts(&flags[i]));
        sibling_eligible(a)
            .cmp(&sibling_eligible(b))
            .then_with(|| {
                selection[b]
                    .projected_value
                    .partial_cmp(&selection[a].projected_value)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| {
                selection[a]
                    .cost
                    .partial_cmp(&selection[b].cost)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| selection[a].name.cmp(&selection[b].name))
    });
    eligible
}

/// Check the post-conditions of a finished assignment.
pub fn validate_assignment(assignments: &[SlotAssignment]) -> Result<(), SlotAssignmentError> {
    if assignments.len() != ROSTER_SIZE {
        return Err(SlotAssignmentError::Invalid {
            detail: format!("{} slots filled, expected {ROSTER_SIZE}", assignments.len()),
        });
    }
    let slots: HashSet<Slot> = assignments.iter().map(|a| a.slot).collect();
    if slots.len() != ROSTER_SIZE {
        return Err(SlotAssignmentError::Invalid {
            detail: "a slot was filled more than once".into(),
        });
    }
    let keys: HashSet<&str> = assignments.iter().map(|a| a.candidate.key.as_str()).collect();
    if keys.len() != ROSTER_SIZE {
        return Err(SlotAssignmentError::Invalid {
            detail: "a candidate occupies more than one slot".into(),
        });
    }
    if let Some(bad) = assignments
        .iter()
        .find(|a| !a.slot.accepts(&a.candidate.eligibility()))
    {
        return Err(SlotAssignmentError::Invalid {
            detail: format!(
                "{} ({}) is not eligible for {}",
                bad.candidate.name, bad.candidate.positions, bad.slot
            ),
        });
    }
    Ok(())
}
