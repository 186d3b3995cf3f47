//! ML Ops Arcade headless demo
//!
//! Plays a scripted run of each mini-game, feeds the results to the hub
//! ledger and logs everything. Set `RUST_LOG=debug` for per-frame detail.
//!
//! Environment:
//! - `MLOPS_ARCADE_SEED`: RNG seed (default 42)
//! - `MLOPS_ARCADE_CONFIG_DIR`: directory holding `<game-id>.json` tuning overrides

use std::path::PathBuf;

use mlops_arcade::config::{GameConfig, GameKind};
use mlops_arcade::hub::HubLedger;
use mlops_arcade::persistence;
use mlops_arcade::platform::{InputSource, ScriptedInput};
use mlops_arcade::renderer::{LogRenderer, Renderer};
use mlops_arcade::sim::{GameSession, Intents, tick};
use mlops_arcade::PersistError;

/// Stop a run that never ends on its own
const MAX_TICKS: u64 = 60 * 60 * 3;

fn intents(f: impl FnOnce(&mut Intents)) -> Intents {
    let mut intents = Intents::default();
    f(&mut intents);
    intents
}

/// Tuning for `kind`, from the override directory if one is configured
fn load_config(kind: GameKind) -> GameConfig {
    let Some(dir) = std::env::var_os("MLOPS_ARCADE_CONFIG_DIR") else {
        return GameConfig::for_game(kind);
    };
    let path = PathBuf::from(dir).join(format!("{}.json", kind.game_id()));
    match std::fs::read_to_string(&path) {
        Ok(json) => {
            log::info!("Loading tuning from {}", path.display());
            GameConfig::from_json_or_default(kind, &json)
        }
        Err(e) => {
            log::warn!("Could not read {} ({}); using defaults", path.display(), e);
            GameConfig::for_game(kind)
        }
    }
}

/// Pick the second hero, spin and shoot for a while, then keep shooting
fn drifter_script() -> ScriptedInput {
    let mut script = ScriptedInput::new()
        .press(intents(|i| i.confirm = true))
        .choose_hero(1)
        .press(intents(|i| i.confirm = true));
    for round in 0..400 {
        let turn = intents(|i| {
            i.move_left = round % 3 == 0;
            i.move_up = round % 5 == 0;
        });
        script = script
            .hold(turn, 6)
            .press(intents(|i| i.shoot = true))
            .idle(3);
    }
    script
}

/// Quick start, then drop pieces shifted to alternating sides
fn stacker_script() -> ScriptedInput {
    let mut script = ScriptedInput::new().press(intents(|i| i.hard_drop = true));
    for piece in 0..300 {
        let side = intents(|i| {
            if piece % 2 == 0 {
                i.move_left = true;
            } else {
                i.move_right = true;
            }
        });
        for _ in 0..piece % 5 {
            script = script.press(side).idle(1);
        }
        if piece % 3 == 0 {
            script = script.press(intents(|i| i.rotate = true));
        }
        script = script.idle(20).press(intents(|i| i.hard_drop = true));
    }
    script
}

/// Run one session to completion (or the tick cap) and return it
fn play(
    mut session: GameSession,
    input: &mut impl InputSource,
    renderer: &mut impl Renderer,
    ledger: &mut HubLedger,
) -> Result<GameSession, PersistError> {
    while session.tick < MAX_TICKS {
        let frame = input.poll();
        let snapshot = tick(&mut session, &frame);
        renderer.draw(&snapshot);

        // Checkpoint and resume halfway through, as a host would on reload
        if session.tick == MAX_TICKS / 2 {
            let saved = persistence::save(&session)?;
            session = persistence::restore(&saved)?;
        }

        if let Some(signal) = session.take_completion() {
            if ledger.record(&signal) {
                log::info!("New best for {}: {}", signal.game_id, signal.score);
            }
            return Ok(session);
        }
    }
    log::warn!(
        "{} still running after {} ticks; stopping",
        session.game_id(),
        MAX_TICKS
    );
    Ok(session)
}

fn main() -> Result<(), PersistError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("ML Ops Arcade (headless) starting...");

    let seed = std::env::var("MLOPS_ARCADE_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    let mut ledger = HubLedger::new();
    let mut renderer = LogRenderer::new(600);

    let runs = [
        (GameKind::DataCleaning, drifter_script()),
        (GameKind::FeatureEngineering, stacker_script()),
    ];
    for (kind, mut script) in runs {
        let session = GameSession::new(load_config(kind), seed);
        let session = play(session, &mut script, &mut renderer, &mut ledger)?;
        log::info!(
            "{}: {:?} after {} ticks, score {}",
            session.game_id(),
            session.phase,
            session.tick,
            session.score
        );
    }

    log::info!(
        "Hub: {} of {} phases complete, next up: {}",
        ledger.completed_count(),
        ledger.phases.len(),
        ledger.next_phase().unwrap_or("none")
    );
    log::info!("Ledger: {}", ledger.to_json()?);
    Ok(())
}
