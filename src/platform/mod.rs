//! Platform abstraction layer
//!
//! Turns host key events into per-tick intents:
//! - `InputSource` is the port the game loop polls once per tick
//! - `InputRouter` maps physical keys to intents for each game
//! - `ScriptedInput` replays a fixed script (demo binary, tests)

use std::collections::{BTreeSet, VecDeque};

use crate::config::GameKind;
use crate::sim::{Intents, TickInput};

/// Milliseconds per frame at 60fps
pub const FRAME_MS: f64 = 1000.0 / 60.0;

/// Anything that can supply the next tick's input
pub trait InputSource {
    fn poll(&mut self) -> TickInput;
}

/// Physical keys the games listen to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
    Enter,
    Escape,
    /// Letter or digit, matched case-insensitively
    Char(char),
}

impl Key {
    fn normalized(self) -> Key {
        match self {
            Key::Char(c) => Key::Char(c.to_ascii_lowercase()),
            other => other,
        }
    }
}

/// Keyboard state to intents, per game
#[derive(Debug, Clone)]
pub struct InputRouter {
    kind: GameKind,
    down: BTreeSet<Key>,
    pressed: Intents,
    hero: Option<usize>,
    now_ms: f64,
}

impl InputRouter {
    pub fn new(kind: GameKind) -> Self {
        Self {
            kind,
            down: BTreeSet::new(),
            pressed: Intents::default(),
            hero: None,
            now_ms: 0.0,
        }
    }

    /// Intents a key drives in this game (empty for unmapped keys)
    pub fn intents_for(&self, key: Key) -> Intents {
        let mut intents = Intents::default();
        match (key.normalized(), self.kind) {
            (Key::Left, _) => intents.move_left = true,
            (Key::Right, _) => intents.move_right = true,
            (Key::Down, _) => intents.move_down = true,
            (Key::Up, GameKind::DataCleaning) => intents.move_up = true,
            (Key::Up, GameKind::FeatureEngineering) => intents.rotate = true,
            (Key::Space, GameKind::DataCleaning) => intents.shoot = true,
            (Key::Space, GameKind::FeatureEngineering) => intents.hard_drop = true,
            (Key::Enter, _) => intents.confirm = true,
            (Key::Escape, _) => {
                intents.pause = true;
                intents.back = true;
            }
            (Key::Char('p'), _) => intents.pause = true,
            (Key::Char('r'), _) => intents.restart = true,
            (Key::Char('m'), _) => intents.menu = true,
            (Key::Char('h'), _) => intents.swap_hero = true,
            _ => {}
        }
        intents
    }

    /// Key went down. Auto-repeat of a held key is not a new press.
    pub fn key_down(&mut self, key: Key) {
        let key = key.normalized();
        if !self.down.insert(key) {
            return;
        }
        if let Key::Char(c) = key {
            if let Some(digit) = c.to_digit(10).filter(|d| *d >= 1) {
                self.hero = Some(digit as usize - 1);
                return;
            }
        }
        let intents = self.intents_for(key);
        self.pressed.merge(intents);
    }

    pub fn key_up(&mut self, key: Key) {
        self.down.remove(&key.normalized());
    }

    /// Host clock for the next poll
    pub fn set_time(&mut self, now_ms: f64) {
        self.now_ms = now_ms;
    }

    /// Drop all key state (focus lost)
    pub fn release_all(&mut self) {
        self.down.clear();
        self.pressed = Intents::default();
        self.hero = None;
    }

    fn held(&self) -> Intents {
        let mut held = Intents::default();
        for key in &self.down {
            held.merge(self.intents_for(*key));
        }
        held
    }
}

impl InputSource for InputRouter {
    /// Held state is sampled; presses since the last poll are consumed
    fn poll(&mut self) -> TickInput {
        TickInput {
            held: self.held(),
            pressed: std::mem::take(&mut self.pressed),
            hero: self.hero.take(),
            now_ms: self.now_ms,
        }
    }
}

/// Pre-recorded input, one entry per tick
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<TickInput>,
    clock_ms: f64,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `intents` held for `ticks` ticks
    pub fn hold(mut self, intents: Intents, ticks: usize) -> Self {
        for _ in 0..ticks {
            self.frames.push_back(TickInput {
                held: intents,
                ..Default::default()
            });
        }
        self
    }

    /// One tick with `intents` pressed (and held)
    pub fn press(mut self, intents: Intents) -> Self {
        self.frames.push_back(TickInput {
            held: intents,
            pressed: intents,
            ..Default::default()
        });
        self
    }

    pub fn choose_hero(mut self, index: usize) -> Self {
        self.frames.push_back(TickInput {
            hero: Some(index),
            ..Default::default()
        });
        self
    }

    pub fn idle(self, ticks: usize) -> Self {
        self.hold(Intents::default(), ticks)
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    pub fn is_finished(&self) -> bool {
        self.frames.is_empty()
    }
}

impl InputSource for ScriptedInput {
    /// Next scripted frame stamped with a 60fps clock; idle once exhausted
    fn poll(&mut self) -> TickInput {
        let mut input = self.frames.pop_front().unwrap_or_default();
        input.now_ms = self.clock_ms;
        self.clock_ms += FRAME_MS;
        input
    }
}
