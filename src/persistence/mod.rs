//! Save/restore of a running session
//!
//! Features:
//! - Versioned JSON envelope tagged with the game id
//! - The RNG state travels with the session, so a restored session continues
//!   exactly where the saved one left off
//! - Restored state is validated before it is handed back

use serde::{Deserialize, Serialize};

use crate::error::PersistError;
use crate::sim::GameSession;

/// Envelope format written by this build
pub const SAVE_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    game_id: &'a str,
    session: &'a GameSession,
}

/// Just enough of the envelope to reject old formats before decoding the body
#[derive(Deserialize)]
struct EnvelopeHeader {
    version: u32,
    game_id: String,
}

#[derive(Deserialize)]
struct Envelope {
    session: GameSession,
}

/// Serialize a session into a versioned JSON envelope
pub fn save(session: &GameSession) -> Result<String, PersistError> {
    let envelope = EnvelopeRef {
        version: SAVE_VERSION,
        game_id: session.game_id(),
        session,
    };
    let json = serde_json::to_string(&envelope)?;
    log::debug!(
        "Saved {} session at tick {} ({} bytes)",
        session.game_id(),
        session.tick,
        json.len()
    );
    Ok(json)
}

/// Decode and validate a saved session
pub fn restore(json: &str) -> Result<GameSession, PersistError> {
    let header: EnvelopeHeader = serde_json::from_str(json)?;
    if header.version != SAVE_VERSION {
        return Err(PersistError::Version {
            found: header.version,
            expected: SAVE_VERSION,
        });
    }

    let Envelope { session } = serde_json::from_str(json)?;
    if header.game_id != session.game_id() {
        return Err(PersistError::GameMismatch {
            envelope: header.game_id,
            session: session.game_id().to_string(),
        });
    }
    session.config.validate()?;
    session
        .check_invariants()
        .map_err(PersistError::InvalidState)?;

    log::info!(
        "Restored {} session at tick {} ({:?}, score {})",
        session.game_id(),
        session.tick,
        session.phase,
        session.score
    );
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameKind;
    use crate::sim::{GamePhase, Intents, TickInput, tick};

    fn scripted(i: usize) -> TickInput {
        TickInput {
            held: Intents {
                move_up: i % 3 == 0,
                move_left: i % 7 < 2,
                move_down: i % 11 == 0,
                ..Default::default()
            },
            pressed: Intents {
                shoot: i % 5 == 0,
                rotate: i % 4 == 0,
                ..Default::default()
            },
            hero: None,
            now_ms: i as f64 * 1000.0 / 60.0,
        }
    }

    fn advanced(kind: GameKind, seed: u64, ticks: usize) -> GameSession {
        let mut session = GameSession::for_game(kind, seed);
        session.start_run();
        for i in 0..ticks {
            tick(&mut session, &scripted(i));
        }
        session
    }

    #[test]
    fn test_restored_session_continues_identically() {
        for kind in [GameKind::DataCleaning, GameKind::FeatureEngineering] {
            let mut original = advanced(kind, 4242, 120);
            let json = save(&original).unwrap();
            let mut restored = restore(&json).unwrap();
            assert_eq!(save(&restored).unwrap(), json);

            for i in 120..240 {
                let input = scripted(i);
                assert_eq!(tick(&mut original, &input), tick(&mut restored, &input));
            }
        }
    }

    #[test]
    fn test_restore_keeps_phase() {
        let mut session = advanced(GameKind::DataCleaning, 7, 10);
        session.phase = GamePhase::Paused;
        let restored = restore(&save(&session).unwrap()).unwrap();
        assert_eq!(restored.phase, GamePhase::Paused);
        assert_eq!(restored.score, session.score);
    }

    #[test]
    fn test_rejects_other_version() {
        let session = advanced(GameKind::DataCleaning, 7, 1);
        let json = save(&session).unwrap().replacen(
            &format!("\"version\":{}", SAVE_VERSION),
            "\"version\":99",
            1,
        );
        assert!(matches!(
            restore(&json),
            Err(PersistError::Version {
                found: 99,
                expected: SAVE_VERSION
            })
        ));
    }

    #[test]
    fn test_rejects_mismatched_game() {
        let session = advanced(GameKind::DataCleaning, 7, 1);
        let json = save(&session)
            .unwrap()
            .replacen("\"game_id\":\"data-cleaning\"", "\"game_id\":\"feature-engineering\"", 1);
        assert!(matches!(restore(&json), Err(PersistError::GameMismatch { .. })));
    }

    #[test]
    fn test_rejects_invalid_state() {
        let mut session = advanced(GameKind::DataCleaning, 7, 1);
        session.hero = 17;
        let json = save(&session).unwrap();
        assert!(matches!(restore(&json), Err(PersistError::InvalidState(_))));
    }

    #[test]
    fn test_rejects_ragged_piece() {
        let mut session = advanced(GameKind::FeatureEngineering, 7, 1);
        let piece = session.board.as_mut().unwrap().current.as_mut().unwrap();
        piece.shape = vec![vec![true, true, true], vec![true]];
        let json = save(&session).unwrap();
        assert!(matches!(restore(&json), Err(PersistError::InvalidState(_))));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut session = advanced(GameKind::DataCleaning, 7, 1);
        session.config.projectile.speed = -1.0;
        let json = save(&session).unwrap();
        assert!(matches!(restore(&json), Err(PersistError::Config(_))));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(restore("{]"), Err(PersistError::Json(_))));
    }
}
