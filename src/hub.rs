//! Workflow hub ledger
//!
//! Each mini-game reports how a run ended; the hub keeps the best score and
//! whether the phase has been completed. Serialized to JSON by the host.

use serde::{Deserialize, Serialize};

use crate::error::PersistError;

/// Workflow phases in hub order. Only the first two have playable games.
pub const WORKFLOW_PHASES: [&str; 5] = [
    "data-cleaning",
    "feature-engineering",
    "model-training",
    "model-deployment",
    "model-monitoring",
];

/// Emitted exactly once when a run reaches `GameOver` or `Victory`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSignal {
    pub game_id: String,
    pub score: u64,
    /// True only for `Victory`
    pub completed: bool,
}

/// Per-phase record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub game_id: String,
    pub best_score: u64,
    pub completed: bool,
    pub runs: u32,
}

/// Completion ledger across every workflow phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubLedger {
    pub phases: Vec<PhaseRecord>,
}

impl Default for HubLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl HubLedger {
    /// Empty ledger with one record per workflow phase
    pub fn new() -> Self {
        Self {
            phases: WORKFLOW_PHASES
                .iter()
                .map(|id| PhaseRecord {
                    game_id: id.to_string(),
                    ..Default::default()
                })
                .collect(),
        }
    }

    pub fn get(&self, game_id: &str) -> Option<&PhaseRecord> {
        self.phases.iter().find(|p| p.game_id == game_id)
    }

    /// Fold a completion signal in. Returns true if it set a new best score.
    ///
    /// Completion is sticky: a later defeat never clears it.
    pub fn record(&mut self, signal: &CompletionSignal) -> bool {
        let Some(phase) = self.phases.iter_mut().find(|p| p.game_id == signal.game_id) else {
            log::warn!("Ignoring completion for unknown game '{}'", signal.game_id);
            return false;
        };
        phase.runs = phase.runs.saturating_add(1);
        phase.completed |= signal.completed;
        let new_best = signal.score > phase.best_score;
        if new_best {
            phase.best_score = signal.score;
        }
        log::info!(
            "Hub: {} scored {} (best {}, completed {})",
            phase.game_id,
            signal.score,
            phase.best_score,
            phase.completed
        );
        new_best
    }

    /// Phases completed, in hub order
    pub fn completed_count(&self) -> usize {
        self.phases.iter().filter(|p| p.completed).count()
    }

    /// First phase not yet completed
    pub fn next_phase(&self) -> Option<&str> {
        self.phases
            .iter()
            .find(|p| !p.completed)
            .map(|p| p.game_id.as_str())
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load a ledger; phases missing from older saves are added back empty
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let mut ledger: HubLedger = serde_json::from_str(json)?;
        for id in WORKFLOW_PHASES {
            if ledger.get(id).is_none() {
                ledger.phases.push(PhaseRecord {
                    game_id: id.to_string(),
                    ..Default::default()
                });
            }
        }
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(game_id: &str, score: u64, completed: bool) -> CompletionSignal {
        CompletionSignal {
            game_id: game_id.to_string(),
            score,
            completed,
        }
    }

    #[test]
    fn test_new_ledger_lists_all_phases() {
        let ledger = HubLedger::new();
        assert_eq!(ledger.phases.len(), 5);
        assert_eq!(ledger.next_phase(), Some("data-cleaning"));
        assert_eq!(ledger.completed_count(), 0);
    }

    #[test]
    fn test_record_tracks_best_score() {
        let mut ledger = HubLedger::new();
        assert!(ledger.record(&signal("data-cleaning", 300, false)));
        assert!(!ledger.record(&signal("data-cleaning", 200, false)));
        assert!(ledger.record(&signal("data-cleaning", 450, false)));
        let phase = ledger.get("data-cleaning").unwrap();
        assert_eq!(phase.best_score, 450);
        assert_eq!(phase.runs, 3);
        assert!(!phase.completed);
    }

    #[test]
    fn test_completion_is_sticky() {
        let mut ledger = HubLedger::new();
        ledger.record(&signal("data-cleaning", 900, true));
        ledger.record(&signal("data-cleaning", 10, false));
        assert!(ledger.get("data-cleaning").unwrap().completed);
        assert_eq!(ledger.next_phase(), Some("feature-engineering"));
    }

    #[test]
    fn test_zero_score_is_not_a_new_best() {
        let mut ledger = HubLedger::new();
        assert!(!ledger.record(&signal("feature-engineering", 0, false)));
    }

    #[test]
    fn test_unknown_game_ignored() {
        let mut ledger = HubLedger::new();
        assert!(!ledger.record(&signal("pinball", 100, true)));
        assert_eq!(ledger, HubLedger::new());
    }

    #[test]
    fn test_json_round_trip_fills_missing_phases() {
        let mut ledger = HubLedger::new();
        ledger.record(&signal("feature-engineering", 1200, false));
        let json = ledger.to_json().unwrap();
        assert_eq!(HubLedger::from_json(&json).unwrap(), ledger);

        let partial = r#"{"phases":[{"game_id":"data-cleaning","best_score":5,"completed":true,"runs":1}]}"#;
        let restored = HubLedger::from_json(partial).unwrap();
        assert_eq!(restored.phases.len(), 5);
        assert!(restored.get("data-cleaning").unwrap().completed);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(HubLedger::from_json("not json").is_err());
    }
}
