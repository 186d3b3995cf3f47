//! Game tuning and per-game flavor
//!
//! Every game shares the same simulation core; what differs between the
//! mini-games (glyph sets, palettes, win condition, physics constants) lives
//! here. Configs are plain serde structs so a host can ship them as JSON.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Which mini-game a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameKind {
    /// "Bad Data Matrix": drift, turn, and shoot corrupted data apart
    DataCleaning,
    /// "Feature Forge": stack falling feature blocks into full rows
    FeatureEngineering,
}

impl GameKind {
    /// Hub identifier for this game
    pub fn game_id(&self) -> &'static str {
        match self {
            GameKind::DataCleaning => "data-cleaning",
            GameKind::FeatureEngineering => "feature-engineering",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "data-cleaning" => Some(GameKind::DataCleaning),
            "feature-engineering" => Some(GameKind::FeatureEngineering),
            _ => None,
        }
    }

    /// True for games driven by the stack board instead of free movers
    pub fn uses_board(&self) -> bool {
        matches!(self, GameKind::FeatureEngineering)
    }
}

/// Playfield dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
}

/// Anisotropic collision envelope around the player sprite
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeTuning {
    /// Full ellipse width before inflation
    pub width: f32,
    /// Full ellipse height before inflation
    pub height: f32,
    /// Fraction of the other body's radius added to both semi-axes
    pub hazard_factor: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerTuning {
    pub radius: f32,
    pub turn_rate: f32,
    pub thrust: f32,
    pub reverse_factor: f32,
    pub friction: f32,
    pub max_speed: f32,
    pub invincibility_ticks: u32,
    pub lives: u32,
    /// Distance from sprite center to where shots appear
    pub muzzle_offset: f32,
    pub envelope: EnvelopeTuning,
}

/// A selectable hero. Heroes differ only in sprite and envelope placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroProfile {
    pub name: String,
    pub sprite: String,
    /// Envelope center offset along the sprite's horizontal axis
    pub collision_offset_x: f32,
    /// Envelope tilt relative to the sprite
    pub collision_tilt_degrees: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileTuning {
    pub speed: f32,
    pub radius: f32,
    pub ttl: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardTuning {
    /// Base radius of a Large hazard
    pub initial_radius: f32,
    /// Radius where the reward curve peaks
    pub min_radius: f32,
    /// Child radius relative to parent on split
    pub split_factor: f32,
    /// Random multiplier applied to every spawned radius
    pub radius_jitter: (f32, f32),
    pub speed_max: f32,
    pub speed_min_factor: f32,
    pub spin_max: f32,
    pub min_reward: u32,
    pub max_reward: u32,
    /// Speed scale gained per level above 1
    pub level_speed_step: f32,
    pub max_speed_scale: f32,
    /// Outline vertex count range (half-open)
    pub vertex_range: (u32, u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveTuning {
    pub base_count: u32,
    pub score_step: u64,
    /// Added to twice the hazard radius to form the spawn clearance
    pub clearance_padding: f32,
    pub max_placement_attempts: u32,
    pub frenzy_multiplier: u32,
}

/// The one-shot area-effect weapon and the pickup that arms it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecialTuning {
    pub pickup_score: u64,
    pub pickup_radius: f32,
    /// Ticks the shot travels before it starts expanding
    pub arm_ticks: u32,
    /// Radius gained per tick while expanding
    pub growth: f32,
    /// Max radius as a multiple of the larger arena dimension
    pub max_radius_factor: f32,
    /// Cosmetic sparks per hazard swept by the growing ring
    pub sweep_sparks: u32,
    pub sweep_words: u32,
    /// Cosmetic sparks per hazard cleared when the ring completes
    pub finale_sparks: u32,
    pub finale_words: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressionTuning {
    pub level_threshold: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StackTuning {
    pub cols: usize,
    pub rows: usize,
    pub base_interval_ms: f64,
    pub min_interval_ms: f64,
    pub level_step_ms: f64,
    pub line_step_ms: f64,
}

/// How a session reaches `Victory`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WinCondition {
    /// The special weapon's ring reaches its maximum radius
    AreaEffectComplete,
    /// Score reaches the given value
    ScoreReached(u64),
    /// No victory; the run ends only on game over
    Endless,
}

/// Cosmetic flavor and win rule for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flavor {
    pub title: String,
    /// Glyphs scattered over hazards
    pub glyphs: Vec<String>,
    /// Words drawn for standard shots
    pub projectile_words: Vec<String>,
    /// Text carried by burst particles
    pub burst_word: String,
    /// Hazard hue range (HSB degrees)
    pub hue_range: (f32, f32),
    pub win: WinCondition,
    pub victory_text: String,
}

/// Complete tuning for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub kind: GameKind,
    pub arena: ArenaConfig,
    pub player: PlayerTuning,
    pub heroes: Vec<HeroProfile>,
    pub projectile: ProjectileTuning,
    pub hazards: HazardTuning,
    pub waves: WaveTuning,
    pub special: SpecialTuning,
    pub progression: ProgressionTuning,
    pub stack: StackTuning,
    pub flavor: Flavor,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::for_game(GameKind::DataCleaning)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl GameConfig {
    /// Default tuning for a game
    pub fn for_game(kind: GameKind) -> Self {
        let flavor = match kind {
            GameKind::DataCleaning => Flavor {
                title: "Bad Data Matrix".to_string(),
                glyphs: strings(&[
                    "0", "1", ";", "{", "}", "()", "=>", "if", "0x", "#!", "*", "&",
                ]),
                projectile_words: strings(&["SELECT", "DELETE", "WHERE", "UPDATE"]),
                burst_word: "SQL".to_string(),
                hue_range: (100.0, 140.0),
                win: WinCondition::AreaEffectComplete,
                victory_text: "Data Matrix Cleaned!".to_string(),
            },
            GameKind::FeatureEngineering => Flavor {
                title: "Feature Forge".to_string(),
                glyphs: strings(&["NORMALIZE", "ONE-HOT", "OUTER", "LEFT", "RIGHT", "INNER", "JOIN"]),
                projectile_words: Vec::new(),
                burst_word: "FEATURE".to_string(),
                hue_range: (120.0, 300.0),
                win: WinCondition::Endless,
                victory_text: "Features Engineered!".to_string(),
            },
        };

        Self {
            kind,
            arena: ArenaConfig {
                width: ARENA_WIDTH,
                height: ARENA_HEIGHT,
            },
            player: PlayerTuning {
                radius: PLAYER_SIZE / 2.0,
                turn_rate: PLAYER_TURN_RATE,
                thrust: PLAYER_THRUST,
                reverse_factor: PLAYER_REVERSE_FACTOR,
                friction: PLAYER_FRICTION,
                max_speed: PLAYER_MAX_SPEED,
                invincibility_ticks: PLAYER_INVINCIBILITY_TICKS,
                lives: PLAYER_LIVES,
                muzzle_offset: ENVELOPE_HEIGHT / 2.0 + 10.0,
                envelope: EnvelopeTuning {
                    width: ENVELOPE_WIDTH,
                    height: ENVELOPE_HEIGHT,
                    hazard_factor: ENVELOPE_HAZARD_FACTOR,
                },
            },
            heroes: vec![
                HeroProfile {
                    name: "Dave".to_string(),
                    sprite: "dave".to_string(),
                    collision_offset_x: -ENVELOPE_OFFSET_X,
                    collision_tilt_degrees: ENVELOPE_TILT_DEGREES,
                },
                // Second sprite is mirrored, so the envelope mirrors too
                HeroProfile {
                    name: "Nadya".to_string(),
                    sprite: "nadya".to_string(),
                    collision_offset_x: ENVELOPE_OFFSET_X,
                    collision_tilt_degrees: -ENVELOPE_TILT_DEGREES,
                },
            ],
            projectile: ProjectileTuning {
                speed: BULLET_SPEED,
                radius: BULLET_RADIUS,
                ttl: BULLET_TTL,
            },
            hazards: HazardTuning {
                initial_radius: HAZARD_INIT_RADIUS,
                min_radius: HAZARD_MIN_RADIUS,
                split_factor: HAZARD_SPLIT_FACTOR,
                radius_jitter: (0.7, 1.1),
                speed_max: HAZARD_SPEED_MAX,
                speed_min_factor: 0.4,
                spin_max: 0.015,
                min_reward: HAZARD_MIN_REWARD,
                max_reward: HAZARD_MAX_REWARD,
                level_speed_step: 0.05,
                max_speed_scale: 2.0,
                vertex_range: (6, 12),
            },
            waves: WaveTuning {
                base_count: HAZARD_INIT_NUM,
                score_step: WAVE_SCORE_STEP,
                clearance_padding: PLAYER_SIZE * 2.0,
                max_placement_attempts: PLACEMENT_ATTEMPTS,
                frenzy_multiplier: FRENZY_MULTIPLIER,
            },
            special: SpecialTuning {
                pickup_score: PICKUP_SCORE,
                pickup_radius: PICKUP_RADIUS,
                arm_ticks: 10,
                growth: 12.0,
                max_radius_factor: 1.5,
                sweep_sparks: 10,
                sweep_words: 3,
                finale_sparks: 5,
                finale_words: 2,
            },
            progression: ProgressionTuning {
                level_threshold: LEVEL_THRESHOLD,
            },
            stack: StackTuning {
                cols: STACK_COLS,
                rows: STACK_ROWS,
                base_interval_ms: FALL_INTERVAL_MS,
                min_interval_ms: MIN_FALL_INTERVAL_MS,
                level_step_ms: 50.0,
                line_step_ms: 10.0,
            },
            flavor,
        }
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config, falling back to the game's defaults on any error
    pub fn from_json_or_default(kind: GameKind, json: &str) -> Self {
        match Self::from_json(json) {
            Ok(config) if config.kind == kind => config,
            Ok(config) => {
                log::warn!(
                    "Config is for {}, expected {}; using defaults",
                    config.kind.game_id(),
                    kind.game_id()
                );
                Self::for_game(kind)
            }
            Err(e) => {
                log::warn!("Invalid config for {} ({}); using defaults", kind.game_id(), e);
                Self::for_game(kind)
            }
        }
    }

    /// Largest radius the area-effect ring grows to
    pub fn area_effect_max_radius(&self) -> f32 {
        self.arena.width.max(self.arena.height) * self.special.max_radius_factor
    }

    /// Hero profile by index, falling back to the first hero
    pub fn hero(&self, index: usize) -> Option<&HeroProfile> {
        self.heroes.get(index).or_else(|| self.heroes.first())
    }

    /// Check every field the simulation relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("arena.width", self.arena.width)?;
        positive("arena.height", self.arena.height)?;

        let p = &self.player;
        positive("player.radius", p.radius)?;
        non_negative("player.turn_rate", p.turn_rate)?;
        non_negative("player.thrust", p.thrust)?;
        non_negative("player.reverse_factor", p.reverse_factor)?;
        positive("player.max_speed", p.max_speed)?;
        positive("player.muzzle_offset", p.muzzle_offset)?;
        positive("player.envelope.width", p.envelope.width)?;
        positive("player.envelope.height", p.envelope.height)?;
        non_negative("player.envelope.hazard_factor", p.envelope.hazard_factor)?;
        if !(p.friction > 0.0 && p.friction <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "player.friction",
                value: p.friction as f64,
            });
        }
        if p.lives == 0 {
            return Err(ConfigError::InvalidValue {
                field: "player.lives",
                value: 0.0,
            });
        }
        if self.heroes.is_empty() {
            return Err(ConfigError::Empty("heroes"));
        }

        positive("projectile.speed", self.projectile.speed)?;
        positive("projectile.radius", self.projectile.radius)?;

        let h = &self.hazards;
        positive("hazards.initial_radius", h.initial_radius)?;
        positive("hazards.min_radius", h.min_radius)?;
        ordered("hazards.min_radius", h.min_radius, h.initial_radius)?;
        positive("hazards.split_factor", h.split_factor)?;
        positive("hazards.radius_jitter.0", h.radius_jitter.0)?;
        ordered("hazards.radius_jitter", h.radius_jitter.0, h.radius_jitter.1)?;
        positive("hazards.speed_max", h.speed_max)?;
        non_negative("hazards.speed_min_factor", h.speed_min_factor)?;
        ordered("hazards.speed_min_factor", h.speed_min_factor, 1.0)?;
        non_negative("hazards.spin_max", h.spin_max)?;
        non_negative("hazards.level_speed_step", h.level_speed_step)?;
        if !(h.max_speed_scale >= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "hazards.max_speed_scale",
                value: h.max_speed_scale as f64,
            });
        }
        if h.vertex_range.0 < 3 || h.vertex_range.0 >= h.vertex_range.1 {
            return Err(ConfigError::InvertedRange {
                field: "hazards.vertex_range",
                lo: h.vertex_range.0 as f64,
                hi: h.vertex_range.1 as f64,
            });
        }
        ordered("hazards.reward", h.min_reward as f32, h.max_reward as f32)?;

        if self.waves.score_step == 0 {
            return Err(ConfigError::InvalidValue {
                field: "waves.score_step",
                value: 0.0,
            });
        }
        if self.waves.max_placement_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "waves.max_placement_attempts",
                value: 0.0,
            });
        }
        if self.waves.frenzy_multiplier == 0 {
            return Err(ConfigError::InvalidValue {
                field: "waves.frenzy_multiplier",
                value: 0.0,
            });
        }
        non_negative("waves.clearance_padding", self.waves.clearance_padding)?;

        positive("special.pickup_radius", self.special.pickup_radius)?;
        positive("special.growth", self.special.growth)?;
        positive("special.max_radius_factor", self.special.max_radius_factor)?;

        if self.progression.level_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "progression.level_threshold",
                value: 0.0,
            });
        }

        let s = &self.stack;
        if s.cols < 4 || s.rows < 4 {
            return Err(ConfigError::InvalidValue {
                field: "stack.cols",
                value: s.cols.min(s.rows) as f64,
            });
        }
        if !(s.min_interval_ms > 0.0) || !s.base_interval_ms.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "stack.min_interval_ms",
                value: s.min_interval_ms,
            });
        }
        if s.min_interval_ms > s.base_interval_ms {
            return Err(ConfigError::InvertedRange {
                field: "stack.interval_ms",
                lo: s.min_interval_ms,
                hi: s.base_interval_ms,
            });
        }

        let f = &self.flavor;
        if f.glyphs.is_empty() {
            return Err(ConfigError::Empty("flavor.glyphs"));
        }
        ordered("flavor.hue_range", f.hue_range.0, f.hue_range.1)?;

        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            value: value as f64,
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            value: value as f64,
        })
    }
}

fn ordered(field: &'static str, lo: f32, hi: f32) -> Result<(), ConfigError> {
    if !lo.is_finite() || !hi.is_finite() || lo > hi {
        return Err(ConfigError::InvertedRange {
            field,
            lo: lo as f64,
            hi: hi as f64,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        for kind in [GameKind::DataCleaning, GameKind::FeatureEngineering] {
            let config = GameConfig::for_game(kind);
            assert!(config.validate().is_ok(), "{:?} defaults invalid", kind);
            assert_eq!(config.kind, kind);
        }
    }

    #[test]
    fn test_game_id_round_trip() {
        for kind in [GameKind::DataCleaning, GameKind::FeatureEngineering] {
            assert_eq!(GameKind::from_id(kind.game_id()), Some(kind));
        }
        assert_eq!(GameKind::from_id("model-training"), None);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = GameConfig::default();
        config.arena.width = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "arena.width", .. })
        ));

        let mut config = GameConfig::default();
        config.hazards.radius_jitter = (1.2, 0.8);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange { field: "hazards.radius_jitter", .. })
        ));

        let mut config = GameConfig::default();
        config.heroes.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Empty("heroes"))));

        let mut config = GameConfig::default();
        config.player.friction = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_round_trip() {
        let config = GameConfig::for_game(GameKind::FeatureEngineering);
        let json = serde_json::to_string(&config).unwrap();
        let parsed = GameConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_from_json_or_default_falls_back() {
        let config = GameConfig::from_json_or_default(GameKind::DataCleaning, "{ not json");
        assert_eq!(config, GameConfig::for_game(GameKind::DataCleaning));

        // Valid document for the wrong game also falls back
        let other = serde_json::to_string(&GameConfig::for_game(GameKind::FeatureEngineering)).unwrap();
        let config = GameConfig::from_json_or_default(GameKind::DataCleaning, &other);
        assert_eq!(config.kind, GameKind::DataCleaning);
    }

    #[test]
    fn test_hero_lookup_falls_back_to_first() {
        let config = GameConfig::default();
        assert_eq!(config.hero(1).map(|h| h.name.as_str()), Some("Nadya"));
        assert_eq!(config.hero(7).map(|h| h.name.as_str()), Some("Dave"));
    }
}
