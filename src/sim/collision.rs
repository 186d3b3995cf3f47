//! Collision detection and resolution
//!
//! The player's sprite is tall and narrow, so it collides through a rotated
//! ellipse rather than a circle. Everything else is circle/circle, apart from
//! the area effect, which sweeps every hazard whose center lies inside its
//! ring.

use glam::Vec2;

use super::entity::{EntityId, Hazard, Player};
use super::spawner::{self, SpawnContext};
use super::state::GameSession;
use crate::config::{EnvelopeTuning, HeroProfile};

/// What removed a hazard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitCause {
    Projectile(EntityId),
    AreaEffect(EntityId),
}

/// Outcome of one detected contact
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionEvent {
    HazardDestroyed {
        hazard: EntityId,
        by: HitCause,
        pos: Vec2,
        hue: f32,
        reward: u32,
        /// Ids of the split children (empty for Small or area-effect kills)
        children: Vec<EntityId>,
    },
    /// Hit but still has hit points left
    HazardDamaged {
        hazard: EntityId,
        projectile: EntityId,
        hit_points: u32,
    },
    PlayerHit {
        hazard: EntityId,
        lives_left: u32,
    },
    PickupCollected {
        pickup: EntityId,
    },
}

/// Point-in-rotated-ellipse test
pub fn ellipse_contains(center: Vec2, semi_axes: Vec2, rotation: f32, point: Vec2) -> bool {
    if semi_axes.x <= 0.0 || semi_axes.y <= 0.0 {
        return false;
    }
    // Rotate into the ellipse's frame
    let local = Vec2::from_angle(-rotation).rotate(point - center);
    let nx = local.x / semi_axes.x;
    let ny = local.y / semi_axes.y;
    nx * nx + ny * ny <= 1.0
}

/// Center and rotation of the player's collision envelope
pub fn player_envelope(player: &Player, hero: &HeroProfile) -> (Vec2, f32) {
    let rotation = player.visual_rotation();
    let center = player.mover.pos + Vec2::from_angle(rotation) * hero.collision_offset_x;
    (center, rotation + hero.collision_tilt_degrees.to_radians())
}

/// True if a circle of `radius` at `pos` touches the player's envelope
pub fn player_touches(
    player: &Player,
    hero: &HeroProfile,
    envelope: &EnvelopeTuning,
    pos: Vec2,
    radius: f32,
) -> bool {
    let (center, rotation) = player_envelope(player, hero);
    let inflate = radius * envelope.hazard_factor;
    let semi_axes = Vec2::new(
        envelope.width / 2.0 + inflate,
        envelope.height / 2.0 + inflate,
    );
    ellipse_contains(center, semi_axes, rotation, pos)
}

/// Detect and resolve every contact in the current frame.
///
/// Order: area-effect sweep, shots against hazards, player against hazards,
/// player against pickups. Entity-level consequences (spent shots, hit
/// points, splits, lives, pickup collection) are applied here; scoring and
/// phase changes are left to the loop, driven by the returned events.
pub fn resolve(session: &mut GameSession) -> Vec<CollisionEvent> {
    let mut events = Vec::new();
    // Anything created from here on (split children) is not hittable this tick
    let hittable_below = session.peek_next_id();

    sweep_area_effects(session, &mut events);
    shots_against_hazards(session, hittable_below, &mut events);
    player_against_hazards(session, &mut events);
    player_against_pickups(session, &mut events);

    events
}

fn sweep_area_effects(session: &mut GameSession, events: &mut Vec<CollisionEvent>) {
    let GameSession {
        config, entities, ..
    } = session;

    for projectile in entities.projectiles.iter_mut() {
        if projectile.spent {
            continue;
        }
        let center = projectile.mover.pos;
        let projectile_id = projectile.id;
        let Some(effect) = projectile.area_effect_mut() else {
            continue;
        };
        if !effect.is_expanding() {
            continue;
        }
        for hazard in entities.hazards.iter_mut() {
            if !hazard.is_alive() || effect.tallied.contains(&hazard.id) {
                continue;
            }
            if hazard.mover.pos.distance(center) <= effect.radius {
                effect.tallied.insert(hazard.id);
                hazard.hit_points = 0;
                let reward = super::progression::hazard_reward(hazard.mover.radius, &config.hazards);
                log::debug!("Area effect {} swept hazard {} (+{})", projectile_id, hazard.id, reward);
                events.push(CollisionEvent::HazardDestroyed {
                    hazard: hazard.id,
                    by: HitCause::AreaEffect(projectile_id),
                    pos: hazard.mover.pos,
                    hue: hazard.hue,
                    reward,
                    children: Vec::new(),
                });
            }
        }
    }
}

fn shots_against_hazards(
    session: &mut GameSession,
    hittable_below: EntityId,
    events: &mut Vec<CollisionEvent>,
) {
    let splitting_allowed = !session.entities.area_effect_expanding();
    let level = session.level;
    let GameSession {
        config,
        entities,
        rng,
        next_id,
        ..
    } = session;
    let mut children: Vec<Hazard> = Vec::new();

    for projectile in entities.projectiles.iter_mut() {
        if projectile.spent || !projectile.is_standard() {
            continue;
        }
        // First hazard in creation order wins
        let target = entities.hazards.iter_mut().find(|h| {
            h.is_alive() && h.id < hittable_below && projectile.mover.overlaps(&h.mover)
        });
        let Some(hazard) = target else {
            continue;
        };

        projectile.spent = true;
        hazard.hit_points -= 1;
        if hazard.is_alive() {
            events.push(CollisionEvent::HazardDamaged {
                hazard: hazard.id,
                projectile: projectile.id,
                hit_points: hazard.hit_points,
            });
            continue;
        }

        let reward = super::progression::hazard_reward(hazard.mover.radius, &config.hazards);
        let spawned = if splitting_allowed {
            let mut ctx = SpawnContext {
                rng: &mut *rng,
                config: &*config,
                next_id: &mut *next_id,
                avoid: None,
            };
            spawner::split(&mut ctx, hazard, level)
        } else {
            Vec::new()
        };
        log::debug!(
            "Projectile {} destroyed hazard {} (+{}, {} children)",
            projectile.id,
            hazard.id,
            reward,
            spawned.len()
        );
        events.push(CollisionEvent::HazardDestroyed {
            hazard: hazard.id,
            by: HitCause::Projectile(projectile.id),
            pos: hazard.mover.pos,
            hue: hazard.hue,
            reward,
            children: spawned.iter().map(|c| c.id).collect(),
        });
        children.extend(spawned);
    }

    entities.hazards.extend(children);
}

fn player_against_hazards(session: &mut GameSession, events: &mut Vec<CollisionEvent>) {
    let spawn_point = session.player_spawn_point();
    let Some(hero) = session.config.hero(session.hero).cloned() else {
        return;
    };
    let GameSession {
        config,
        entities,
        lives,
        ..
    } = session;
    let Some(player) = entities.player.as_mut() else {
        return;
    };
    if player.is_invincible() {
        return;
    }

    let hit = entities.hazards.iter().find(|h| {
        h.is_alive()
            && player_touches(
                player,
                &hero,
                &config.player.envelope,
                h.mover.pos,
                h.mover.radius,
            )
    });
    // At most one hit per tick; the reset grants invincibility
    if let Some(hazard) = hit {
        *lives = lives.saturating_sub(1);
        player.reset(spawn_point, config.player.invincibility_ticks);
        log::info!("Player hit by hazard {}; {} lives left", hazard.id, lives);
        events.push(CollisionEvent::PlayerHit {
            hazard: hazard.id,
            lives_left: *lives,
        });
    }
}

fn player_against_pickups(session: &mut GameSession, events: &mut Vec<CollisionEvent>) {
    let Some(hero) = session.config.hero(session.hero).cloned() else {
        return;
    };
    let Some(player) = session.entities.player.as_ref() else {
        return;
    };
    let envelope = session.config.player.envelope;

    let mut collected = Vec::new();
    for pickup in session.entities.pickups.iter_mut() {
        if pickup.collected {
            continue;
        }
        if player_touches(player, &hero, &envelope, pickup.mover.pos, pickup.mover.radius) {
            pickup.collected = true;
            collected.push(pickup.id);
        }
    }

    for pickup in collected {
        session.special_armed = true;
        session.frenzy = session.config.waves.frenzy_multiplier;
        log::info!("Pickup {} collected; special weapon armed", pickup);
        events.push(CollisionEvent::PickupCollected { pickup });
    }
}
