//! Simulation entities
//!
//! Every moving thing shares a `Mover` (position, velocity, radius, optional
//! time-to-live). Entities that advance on their own implement `Simulated`;
//! the player is driven by input and integrates separately.

use std::collections::BTreeSet;
use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::snapshot::{Drawable, EntityCategory, Hsba, Shape};
use crate::config::ArenaConfig;
use crate::{normalize_angle, out_of_bounds, wrap_toroidal};

/// Stable entity identifier, allocated in creation order
pub type EntityId = u32;

/// Owner id used for shots fired by the player
pub const PLAYER_ID: EntityId = 0;

/// Maximum live particles; the oldest are dropped first
pub const MAX_PARTICLES: usize = 512;

/// Kinematic core shared by all entities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Remaining ticks; `None` lives until something else removes it
    pub ttl: Option<u32>,
}

impl Mover {
    pub fn new(pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel,
            radius,
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Advance one tick: `pos += vel`, count down ttl
    pub fn step(&mut self) {
        self.pos += self.vel;
        if let Some(ttl) = self.ttl.as_mut() {
            *ttl = ttl.saturating_sub(1);
        }
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite() && self.radius.is_finite()
    }

    pub fn ttl_expired(&self) -> bool {
        self.ttl == Some(0)
    }

    /// Wrap around all four arena edges
    pub fn wrap(&mut self, arena: &ArenaConfig) {
        self.pos = wrap_toroidal(self.pos, self.radius, arena.width, arena.height);
    }

    /// Fully outside the arena (no part of the body visible)
    pub fn off_screen(&self, arena: &ArenaConfig) -> bool {
        out_of_bounds(self.pos, self.radius, arena.width, arena.height)
    }

    /// Circle/circle overlap (strict)
    pub fn overlaps(&self, other: &Mover) -> bool {
        self.pos.distance(other.pos) < self.radius + other.radius
    }
}

/// Per-tick behavior shared by autonomous entities
pub trait Simulated {
    /// Advance one tick
    fn update(&mut self);
    /// True once the entity should be removed
    fn is_expired(&self, arena: &ArenaConfig) -> bool;
    /// Render description for this frame
    fn drawable(&self) -> Drawable;
}

/// The ship/hero the player steers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub mover: Mover,
    /// Facing direction in radians (0 = +x)
    pub heading: f32,
    pub invincible_ticks: u32,
}

impl Player {
    /// New player at `pos`, facing up
    pub fn spawn(pos: Vec2, radius: f32) -> Self {
        Self {
            mover: Mover::new(pos, Vec2::ZERO, radius),
            heading: -FRAC_PI_2,
            invincible_ticks: 0,
        }
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_ticks > 0
    }

    /// Unit vector along the heading
    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.heading)
    }

    /// Sprite rotation (sprite art points up, heading 0 points right)
    pub fn visual_rotation(&self) -> f32 {
        self.heading + FRAC_PI_2
    }

    /// Rotate by `direction * rate` (direction is -1, 0 or 1)
    pub fn turn(&mut self, direction: f32, rate: f32) {
        self.heading = normalize_angle(self.heading + direction * rate);
    }

    /// Accelerate along the heading (negative for reverse)
    pub fn thrust(&mut self, amount: f32) {
        self.mover.vel += self.forward() * amount;
    }

    /// Friction, speed cap, then move
    pub fn integrate(&mut self, friction: f32, max_speed: f32) {
        self.mover.vel *= friction;
        self.mover.vel = self.mover.vel.clamp_length_max(max_speed);
        self.mover.pos += self.mover.vel;
    }

    /// Where shots leave the sprite
    pub fn muzzle(&self, offset: f32) -> Vec2 {
        self.mover.pos + self.forward() * offset
    }

    /// Put back at `pos`, stationary, facing up, with a fresh invincibility window
    pub fn reset(&mut self, pos: Vec2, invincible_ticks: u32) {
        self.mover.pos = pos;
        self.mover.vel = Vec2::ZERO;
        self.heading = -FRAC_PI_2;
        self.invincible_ticks = invincible_ticks;
    }

    pub fn drawable(&self, sprite: &str) -> Drawable {
        // Blink while invincible
        let alpha = if self.is_invincible() && (self.invincible_ticks / 6) % 2 == 0 {
            0.35
        } else {
            1.0
        };
        Drawable {
            category: EntityCategory::Player,
            shape: Shape::Sprite {
                name: sprite.to_string(),
                size: self.mover.radius * 2.0,
            },
            pos: self.mover.pos,
            rotation: self.visual_rotation(),
            color: Hsba::new(0.0, 0.0, 100.0, alpha),
            text: None,
        }
    }
}

/// Stage of an area-effect shot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaStage {
    /// Still travelling like a normal shot
    Arming { ticks_left: u32 },
    /// Stationary, ring growing every tick
    Expanding,
}

/// Expanding ring that clears every hazard it sweeps over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaEffect {
    pub stage: AreaStage,
    pub radius: f32,
    pub max_radius: f32,
    pub growth: f32,
    /// Hazards already destroyed by this activation
    pub tallied: BTreeSet<EntityId>,
}

impl AreaEffect {
    pub fn new(arm_ticks: u32, growth: f32, max_radius: f32) -> Self {
        Self {
            stage: AreaStage::Arming {
                ticks_left: arm_ticks,
            },
            radius: 0.0,
            max_radius,
            growth,
            tallied: BTreeSet::new(),
        }
    }

    pub fn is_expanding(&self) -> bool {
        self.stage == AreaStage::Expanding
    }

    pub fn is_complete(&self) -> bool {
        self.is_expanding() && self.radius >= self.max_radius
    }

    /// Advance arming countdown or grow the ring. Returns true on the tick
    /// the ring starts expanding.
    fn advance(&mut self) -> bool {
        match self.stage {
            AreaStage::Arming { ticks_left } if ticks_left <= 1 => {
                self.stage = AreaStage::Expanding;
                true
            }
            AreaStage::Arming { ticks_left } => {
                self.stage = AreaStage::Arming {
                    ticks_left: ticks_left - 1,
                };
                false
            }
            AreaStage::Expanding => {
                self.radius = (self.radius + self.growth).min(self.max_radius);
                false
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProjectileKind {
    Standard,
    AreaEffect(AreaEffect),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub mover: Mover,
    pub owner: EntityId,
    pub kind: ProjectileKind,
    /// Word drawn on the shot
    pub label: String,
    /// Consumed by a hit or finished; removed at cleanup
    pub spent: bool,
}

impl Projectile {
    pub fn area_effect(&self) -> Option<&AreaEffect> {
        match &self.kind {
            ProjectileKind::AreaEffect(effect) => Some(effect),
            ProjectileKind::Standard => None,
        }
    }

    pub fn area_effect_mut(&mut self) -> Option<&mut AreaEffect> {
        match &mut self.kind {
            ProjectileKind::AreaEffect(effect) => Some(effect),
            ProjectileKind::Standard => None,
        }
    }

    pub fn is_standard(&self) -> bool {
        matches!(self.kind, ProjectileKind::Standard)
    }
}

impl Simulated for Projectile {
    fn update(&mut self) {
        match &mut self.kind {
            ProjectileKind::Standard => self.mover.step(),
            ProjectileKind::AreaEffect(effect) => {
                if !effect.is_expanding() {
                    self.mover.step();
                }
                if effect.advance() {
                    self.mover.vel = Vec2::ZERO;
                    log::debug!("Area effect {} expanding at {:?}", self.id, self.mover.pos);
                }
            }
        }
    }

    fn is_expired(&self, arena: &ArenaConfig) -> bool {
        if self.spent || !self.mover.is_finite() {
            return true;
        }
        match self.kind {
            ProjectileKind::Standard => self.mover.ttl_expired() || self.mover.off_screen(arena),
            // Finishing is handled by the loop so the sweep can be scored
            ProjectileKind::AreaEffect(_) => false,
        }
    }

    fn drawable(&self) -> Drawable {
        match &self.kind {
            ProjectileKind::Standard => Drawable {
                category: EntityCategory::Projectile,
                shape: Shape::Circle {
                    radius: self.mover.radius,
                },
                pos: self.mover.pos,
                rotation: self.mover.vel.to_angle(),
                color: Hsba::new(120.0, 80.0, 100.0, 1.0),
                text: Some(self.label.clone()),
            },
            ProjectileKind::AreaEffect(effect) => {
                let shape = if effect.is_expanding() {
                    Shape::Ring {
                        radius: effect.radius,
                    }
                } else {
                    Shape::Circle {
                        radius: self.mover.radius,
                    }
                };
                Drawable {
                    category: EntityCategory::Projectile,
                    shape,
                    pos: self.mover.pos,
                    rotation: 0.0,
                    color: Hsba::new(190.0, 90.0, 100.0, 0.8),
                    text: Some(self.label.clone()),
                }
            }
        }
    }
}

/// Hazard size tier; each split steps down one tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeClass {
    Large,
    Medium,
    Small,
}

impl SizeClass {
    /// Tier produced by splitting, `None` for Small
    pub fn smaller(self) -> Option<SizeClass> {
        match self {
            SizeClass::Large => Some(SizeClass::Medium),
            SizeClass::Medium => Some(SizeClass::Small),
            SizeClass::Small => None,
        }
    }
}

/// A glyph painted on a hazard, relative to its center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardGlyph {
    pub text: String,
    pub offset: Vec2,
}

/// A drifting chunk of bad data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub id: EntityId,
    pub mover: Mover,
    pub size_class: SizeClass,
    pub hit_points: u32,
    pub angle: f32,
    pub spin: f32,
    /// Radial offsets of the outline vertices
    pub outline: Vec<f32>,
    pub glyphs: Vec<HazardGlyph>,
    pub hue: f32,
}

impl Hazard {
    pub fn is_alive(&self) -> bool {
        self.hit_points > 0
    }

    /// Local-space outline: one vertex per offset, evenly spaced around the
    /// body, each pushed out (or in) by its offset
    pub fn outline_points(&self) -> Vec<Vec2> {
        let count = self.outline.len();
        self.outline
            .iter()
            .enumerate()
            .map(|(i, offset)| {
                let theta = (i as f32 / count as f32) * TAU;
                Vec2::from_angle(theta) * (self.mover.radius + offset).max(0.0)
            })
            .collect()
    }
}

impl Simulated for Hazard {
    fn update(&mut self) {
        self.mover.step();
        self.angle = normalize_angle(self.angle + self.spin);
    }

    fn is_expired(&self, _arena: &ArenaConfig) -> bool {
        !self.is_alive() || !self.mover.is_finite()
    }

    fn drawable(&self) -> Drawable {
        Drawable {
            category: EntityCategory::Hazard,
            shape: Shape::Polygon {
                points: self.outline_points(),
            },
            pos: self.mover.pos,
            rotation: self.angle,
            color: Hsba::new(self.hue, 80.0, 60.0, 1.0),
            text: if self.glyphs.is_empty() {
                None
            } else {
                Some(
                    self.glyphs
                        .iter()
                        .map(|g| g.text.as_str())
                        .collect::<Vec<_>>()
                        .join(" "),
                )
            },
        }
    }
}

/// Purely cosmetic spark or floating word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub mover: Mover,
    /// 1.0 when born, expires at 0
    pub life: f32,
    pub decay: f32,
    pub accel: Vec2,
    pub hue: f32,
    pub glyph: Option<String>,
    pub size: f32,
}

impl Simulated for Particle {
    fn update(&mut self) {
        self.mover.vel += self.accel;
        self.mover.step();
        self.life -= self.decay;
    }

    fn is_expired(&self, arena: &ArenaConfig) -> bool {
        self.life <= 0.0 || !self.mover.is_finite() || self.mover.off_screen(arena)
    }

    fn drawable(&self) -> Drawable {
        let alpha = self.life.clamp(0.0, 1.0);
        Drawable {
            category: EntityCategory::Particle,
            shape: match self.glyph {
                Some(_) => Shape::Text { size: self.size },
                None => Shape::Circle { radius: self.size },
            },
            pos: self.mover.pos,
            rotation: 0.0,
            color: Hsba::new(self.hue, 90.0, 100.0, alpha),
            text: self.glyph.clone(),
        }
    }
}

/// Collectible that arms the area-effect weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub id: EntityId,
    pub mover: Mover,
    pub collected: bool,
    pub angle: f32,
    pub spin: f32,
}

impl Simulated for Pickup {
    fn update(&mut self) {
        self.mover.step();
        self.angle = normalize_angle(self.angle + self.spin);
    }

    fn is_expired(&self, _arena: &ArenaConfig) -> bool {
        self.collected || !self.mover.is_finite()
    }

    fn drawable(&self) -> Drawable {
        Drawable {
            category: EntityCategory::Pickup,
            shape: Shape::Sprite {
                name: "pickup".to_string(),
                size: self.mover.radius * 2.0,
            },
            pos: self.mover.pos,
            rotation: self.angle,
            color: Hsba::new(50.0, 100.0, 100.0, 1.0),
            text: None,
        }
    }
}

/// Owner of every live entity, one collection per category in spawn order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityStore {
    pub player: Option<Player>,
    pub projectiles: Vec<Projectile>,
    pub hazards: Vec<Hazard>,
    pub particles: Vec<Particle>,
    pub pickups: Vec<Pickup>,
}

impl EntityStore {
    pub fn clear(&mut self) {
        self.player = None;
        self.projectiles.clear();
        self.hazards.clear();
        self.particles.clear();
        self.pickups.clear();
    }

    /// Update every autonomous entity. Returns true if an area effect began
    /// expanding this tick.
    pub fn update_all(&mut self) -> bool {
        let mut started = false;
        for projectile in &mut self.projectiles {
            let was_expanding = projectile.area_effect().is_some_and(|e| e.is_expanding());
            projectile.update();
            let now_expanding = projectile.area_effect().is_some_and(|e| e.is_expanding());
            started |= !was_expanding && now_expanding;
        }
        self.hazards.iter_mut().for_each(Simulated::update);
        self.particles.iter_mut().for_each(Simulated::update);
        self.pickups.iter_mut().for_each(Simulated::update);
        started
    }

    /// Only cosmetic particles advance (used outside active play)
    pub fn update_particles(&mut self, arena: &ArenaConfig) {
        self.particles.iter_mut().for_each(Simulated::update);
        self.particles.retain(|p| !p.is_expired(arena));
    }

    /// Drop everything whose `is_expired` holds
    pub fn remove_expired(&mut self, arena: &ArenaConfig) {
        self.projectiles.retain(|p| !p.is_expired(arena));
        self.hazards.retain(|h| !h.is_expired(arena));
        self.particles.retain(|p| !p.is_expired(arena));
        self.pickups.retain(|p| !p.is_expired(arena));
    }

    /// Add a particle, evicting the oldest beyond `MAX_PARTICLES`
    pub fn push_particle(&mut self, particle: Particle) {
        if self.particles.len() >= MAX_PARTICLES {
            let excess = self.particles.len() + 1 - MAX_PARTICLES;
            self.particles.drain(..excess);
        }
        self.particles.push(particle);
    }

    pub fn live_hazards(&self) -> usize {
        self.hazards.iter().filter(|h| h.is_alive()).count()
    }

    /// An area-effect shot exists (arming or expanding)
    pub fn area_effect_in_progress(&self) -> bool {
        self.projectiles
            .iter()
            .any(|p| !p.spent && p.area_effect().is_some())
    }

    pub fn area_effect_expanding(&self) -> bool {
        self.projectiles
            .iter()
            .any(|p| !p.spent && p.area_effect().is_some_and(|e| e.is_expanding()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> ArenaConfig {
        ArenaConfig {
            width: 200.0,
            height: 100.0,
        }
    }

    fn particle(life: f32) -> Particle {
        Particle {
            mover: Mover::new(Vec2::new(50.0, 50.0), Vec2::ZERO, 2.0),
            life,
            decay: 0.5,
            accel: Vec2::new(0.0, 0.2),
            hue: 0.0,
            glyph: None,
            size: 2.0,
        }
    }

    #[test]
    fn test_player_integrate_order() {
        let mut player = Player::spawn(Vec2::new(100.0, 50.0), 50.0);
        player.mover.vel = Vec2::new(10.0, 0.0);
        player.integrate(0.5, 3.0);
        // 10 * 0.5 = 5, capped at 3, then moved
        assert_eq!(player.mover.vel, Vec2::new(3.0, 0.0));
        assert_eq!(player.mover.pos, Vec2::new(103.0, 50.0));
    }

    #[test]
    fn test_player_starts_facing_up() {
        let player = Player::spawn(Vec2::ZERO, 10.0);
        assert!((player.forward() - Vec2::new(0.0, -1.0)).length() < 1e-6);
        assert!(player.visual_rotation().abs() < 1e-6);
    }

    #[test]
    fn test_projectile_ttl_expiry() {
        let mut shot = Projectile {
            id: 1,
            mover: Mover::new(Vec2::new(10.0, 10.0), Vec2::new(1.0, 0.0), 2.0).with_ttl(2),
            owner: 0,
            kind: ProjectileKind::Standard,
            label: "SELECT".to_string(),
            spent: false,
        };
        shot.update();
        assert!(!shot.is_expired(&arena()));
        shot.update();
        assert!(shot.is_expired(&arena()));
    }

    #[test]
    fn test_projectile_expires_off_screen() {
        let shot = Projectile {
            id: 1,
            mover: Mover::new(Vec2::new(-20.0, 10.0), Vec2::ZERO, 2.0),
            owner: 0,
            kind: ProjectileKind::Standard,
            label: String::new(),
            spent: false,
        };
        assert!(shot.is_expired(&arena()));
    }

    #[test]
    fn test_area_effect_arms_then_grows_to_max() {
        let mut shot = Projectile {
            id: 1,
            mover: Mover::new(Vec2::new(10.0, 10.0), Vec2::new(1.0, 0.0), 5.0),
            owner: 0,
            kind: ProjectileKind::AreaEffect(AreaEffect::new(2, 40.0, 100.0)),
            label: String::new(),
            spent: false,
        };
        shot.update();
        assert!(!shot.area_effect().unwrap().is_expanding());
        shot.update();
        let effect = shot.area_effect().unwrap();
        assert!(effect.is_expanding());
        assert_eq!(shot.mover.vel, Vec2::ZERO);
        let parked = shot.mover.pos;

        for _ in 0..5 {
            shot.update();
        }
        let effect = shot.area_effect().unwrap();
        assert_eq!(effect.radius, 100.0);
        assert!(effect.is_complete());
        assert_eq!(shot.mover.pos, parked);
        assert!(!shot.is_expired(&arena()));
    }

    #[test]
    fn test_hazard_outline_radii() {
        let hazard = Hazard {
            id: 1,
            mover: Mover::new(Vec2::ZERO, Vec2::ZERO, 10.0),
            size_class: SizeClass::Small,
            hit_points: 1,
            angle: 0.0,
            spin: 0.0,
            outline: vec![0.0, 2.0, -3.0, -20.0],
            glyphs: Vec::new(),
            hue: 0.0,
        };
        let points = hazard.outline_points();
        assert_eq!(points.len(), 4);
        assert!((points[0] - Vec2::new(10.0, 0.0)).length() < 1e-5);
        assert!((points[1].length() - 12.0).abs() < 1e-5);
        assert!((points[2].length() - 7.0).abs() < 1e-5);
        // Offsets never turn a vertex inside out
        assert_eq!(points[3], Vec2::ZERO);
    }

    #[test]
    fn test_size_class_steps_down() {
        assert_eq!(SizeClass::Large.smaller(), Some(SizeClass::Medium));
        assert_eq!(SizeClass::Medium.smaller(), Some(SizeClass::Small));
        assert_eq!(SizeClass::Small.smaller(), None);
    }

    #[test]
    fn test_particle_decays_and_expires() {
        let mut p = particle(1.0);
        p.update();
        assert_eq!(p.mover.vel, Vec2::new(0.0, 0.2));
        assert!(!p.is_expired(&arena()));
        p.update();
        assert!(p.is_expired(&arena()));
    }

    #[test]
    fn test_non_finite_mover_is_expired() {
        let mut p = particle(1.0);
        p.mover.pos.x = f32::NAN;
        assert!(p.is_expired(&arena()));
    }

    #[test]
    fn test_particle_cap_drops_oldest() {
        let mut store = EntityStore::default();
        for i in 0..MAX_PARTICLES + 5 {
            let mut p = particle(1.0);
            p.size = i as f32;
            store.push_particle(p);
        }
        assert_eq!(store.particles.len(), MAX_PARTICLES);
        assert_eq!(store.particles[0].size, 5.0);
    }
}
