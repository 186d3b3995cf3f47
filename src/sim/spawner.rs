//! Wave spawning and cosmetic randomization
//!
//! Placement and hazard creation borrow only what they need (RNG, tuning,
//! id counter) through `SpawnContext`, so the session can lend disjoint
//! fields while it keeps ownership of the entity collections.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::entity::{EntityId, Hazard, HazardGlyph, Mover, Particle, Pickup, SizeClass};
use super::progression::hazard_speed_scale;
use crate::config::{ArenaConfig, GameConfig, WaveTuning};
use crate::map_range;

/// Borrowed view of the session pieces the spawner needs
pub struct SpawnContext<'a> {
    pub rng: &'a mut Pcg32,
    pub config: &'a GameConfig,
    pub next_id: &'a mut EntityId,
    /// Position new hazards must keep clear of
    pub avoid: Option<Vec2>,
}

impl SpawnContext<'_> {
    fn alloc_id(&mut self) -> EntityId {
        let id = *self.next_id;
        *self.next_id = self.next_id.wrapping_add(1);
        id
    }
}

/// Hazards in the next wave: `(base + floor(score / step)) * frenzy`
pub fn wave_size(score: u64, frenzy: u32, tuning: &WaveTuning) -> u32 {
    let extra = u32::try_from(score / tuning.score_step.max(1)).unwrap_or(u32::MAX);
    tuning
        .base_count
        .saturating_add(extra)
        .saturating_mul(frenzy.max(1))
}

/// Pick a random point at least `clearance` from `avoid`.
///
/// Gives up after `attempts` samples and returns the last one, so the call
/// always terminates even when no clear spot exists.
pub fn find_clear_position(
    rng: &mut Pcg32,
    arena: &ArenaConfig,
    avoid: Option<Vec2>,
    clearance: f32,
    attempts: u32,
) -> Vec2 {
    let mut pos = random_point(rng, arena);
    let Some(avoid) = avoid else {
        return pos;
    };
    for _ in 1..attempts.max(1) {
        if pos.distance(avoid) >= clearance {
            return pos;
        }
        pos = random_point(rng, arena);
    }
    if pos.distance(avoid) < clearance {
        log::debug!("No clear spawn point after {} attempts; using {:?}", attempts, pos);
    }
    pos
}

fn random_point(rng: &mut Pcg32, arena: &ArenaConfig) -> Vec2 {
    Vec2::new(
        rng.random::<f32>() * arena.width,
        rng.random::<f32>() * arena.height,
    )
}

fn random_direction(rng: &mut Pcg32) -> Vec2 {
    Vec2::from_angle(rng.random::<f32>() * TAU)
}

/// Build one hazard with randomized heading, speed, spin, and cosmetics
pub fn create_hazard(
    ctx: &mut SpawnContext<'_>,
    pos: Vec2,
    size_class: SizeClass,
    base_radius: f32,
    speed_scale: f32,
) -> Hazard {
    let config = ctx.config;
    let tuning = &config.hazards;
    let flavor = &config.flavor;
    let id = ctx.alloc_id();
    let rng = &mut *ctx.rng;

    let (jitter_lo, jitter_hi) = tuning.radius_jitter;
    let radius = base_radius * rng.random_range(jitter_lo..=jitter_hi);
    let speed = tuning.speed_max * rng.random_range(tuning.speed_min_factor..=1.0) * speed_scale;
    let vel = random_direction(rng) * speed;
    let spin = rng.random_range(-tuning.spin_max..=tuning.spin_max);
    let angle = rng.random::<f32>() * TAU;

    let vertices = rng.random_range(tuning.vertex_range.0..tuning.vertex_range.1);
    let outline = (0..vertices)
        .map(|_| rng.random_range(-0.5 * radius..=0.3 * radius))
        .collect();

    let glyph_count = map_range(radius, tuning.min_radius, tuning.initial_radius, 1.0, 4.0)
        .floor()
        .clamp(1.0, 4.0) as usize;
    let glyphs = (0..glyph_count)
        .filter_map(|_| {
            let text = flavor.glyphs.get(rng.random_range(0..flavor.glyphs.len().max(1)))?;
            let offset = random_direction(rng) * rng.random::<f32>() * radius * 0.5;
            Some(HazardGlyph {
                text: text.clone(),
                offset,
            })
        })
        .collect();
    let hue = rng.random_range(flavor.hue_range.0..=flavor.hue_range.1);

    Hazard {
        id,
        mover: Mover::new(pos, vel, radius),
        size_class,
        hit_points: 1,
        angle,
        spin,
        outline,
        glyphs,
        hue,
    }
}

/// Spawn a full wave of Large hazards for `level` and `score`
pub fn spawn(ctx: &mut SpawnContext<'_>, level: u32, score: u64, frenzy: u32) -> Vec<Hazard> {
    let config = ctx.config;
    let count = wave_size(score, frenzy, &config.waves);
    let speed_scale = hazard_speed_scale(level, &config.hazards);
    let clearance = config.hazards.initial_radius * 2.0 + config.waves.clearance_padding;

    let hazards: Vec<Hazard> = (0..count)
        .map(|_| {
            let pos = find_clear_position(
                ctx.rng,
                &config.arena,
                ctx.avoid,
                clearance,
                config.waves.max_placement_attempts,
            );
            create_hazard(
                ctx,
                pos,
                SizeClass::Large,
                config.hazards.initial_radius,
                speed_scale,
            )
        })
        .collect();

    log::info!(
        "Spawned wave of {} hazards (level {}, score {}, frenzy x{})",
        hazards.len(),
        level,
        score,
        frenzy
    );
    hazards
}

/// Two children of the next smaller class at the parent's position
pub fn split(ctx: &mut SpawnContext<'_>, parent: &Hazard, level: u32) -> Vec<Hazard> {
    let Some(child_class) = parent.size_class.smaller() else {
        return Vec::new();
    };
    let child_radius = parent.mover.radius * ctx.config.hazards.split_factor;
    let speed_scale = hazard_speed_scale(level, &ctx.config.hazards);
    (0..2)
        .map(|_| create_hazard(ctx, parent.mover.pos, child_class, child_radius, speed_scale))
        .collect()
}

/// The special-weapon pickup at a random spot away from the edges
pub fn spawn_pickup(ctx: &mut SpawnContext<'_>) -> Pickup {
    let arena = ctx.config.arena;
    let pos = Vec2::new(
        ctx.rng.random_range(0.2f32..=0.8) * arena.width,
        ctx.rng.random_range(0.2f32..=0.8) * arena.height,
    );
    let spin = ctx.rng.random_range(-0.03f32..=0.03);
    Pickup {
        id: ctx.alloc_id(),
        mover: Mover::new(pos, Vec2::ZERO, ctx.config.special.pickup_radius),
        collected: false,
        angle: 0.0,
        spin,
    }
}

/// Burst of cosmetic particles: gravity-bound sparks plus rising words
pub fn burst(
    rng: &mut Pcg32,
    pos: Vec2,
    hue: f32,
    sparks: u32,
    words: u32,
    word: &str,
) -> Vec<Particle> {
    let mut particles = Vec::with_capacity((sparks + words) as usize);
    for _ in 0..sparks {
        let vel = random_direction(rng) * rng.random_range(5.0f32..=15.0);
        particles.push(Particle {
            mover: Mover::new(pos, vel, 4.0),
            life: 1.0,
            decay: 0.02,
            accel: Vec2::new(0.0, 0.2),
            hue: (hue + rng.random_range(-20.0f32..=20.0)).rem_euclid(360.0),
            glyph: None,
            size: rng.random_range(2.0f32..=5.0),
        });
    }
    for _ in 0..words {
        let vel = random_direction(rng) * rng.random_range(2.0f32..=6.0);
        particles.push(Particle {
            mover: Mover::new(pos, vel, 12.0),
            life: 1.0,
            decay: 0.025,
            accel: Vec2::new(0.0, -0.1),
            hue,
            glyph: Some(word.to_string()),
            size: 16.0,
        });
    }
    particles
}
