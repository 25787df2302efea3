/// The tick function: advances the world by one discrete step.
///
/// Processing order:
///   1. Input resolution (at most one queued command)
///   2. Physics step (gravity, roll-off)
///   3. Crush check at the actor's cell
///   4. Exit open recompute
///   5. Win check + score finalization
///   6. Publish actor position
///
/// Physics always runs after the actor has acted, so a boulder pushed
/// this tick is not re-examined until the physics pass.
///
/// `update_time` is a separate real-time channel: it only counts down.

use crate::domain::physics::{self, Motion};
use super::event::GameEvent;
use super::world::{Status, World};

// ══════════════════════════════════════════════════════════════
// Main entry points
// ══════════════════════════════════════════════════════════════

pub fn tick(world: &mut World) -> Vec<GameEvent> {
    if world.status != Status::Playing { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();

    resolve_input(world, &mut events);
    resolve_physics(world, &mut events);
    if resolve_crush(world, &mut events) { return events; }
    resolve_exit(world, &mut events);
    resolve_win(world, &mut events);
    world.player = world.actor.position();

    events
}

/// Count the clock down by `delta_ms`. Reaching zero kills the attempt.
/// A clock already at zero (no time limit) never expires.
pub fn update_time(world: &mut World, delta_ms: f64) -> Vec<GameEvent> {
    if world.status != Status::Playing { return vec![]; }
    if world.time_remaining <= 0.0 { return vec![]; }

    world.time_remaining = (world.time_remaining - delta_ms / 1000.0).max(0.0);

    if world.time_remaining <= 0.0 {
        world.status = Status::Dead;
        log::debug!("level {}: time up", world.level);
        return vec![GameEvent::TimeUp];
    }
    vec![]
}

/// Score at the winning moment: running score, whole seconds left times
/// the time bonus, and the perfect-clear bonus when every gem present at
/// level start was collected.
pub fn final_score(world: &World) -> u32 {
    let scoring = &world.scoring;
    let seconds = world.time_remaining.floor() as u32;
    let mut score = world.score.saturating_add(seconds.saturating_mul(scoring.time_bonus));

    if world.gems_total > 0 && world.gems_collected >= world.gems_total {
        score = score.saturating_add(scoring.perfect_clear);
    }
    score
}

// ══════════════════════════════════════════════════════════════
// Input
// ══════════════════════════════════════════════════════════════

fn resolve_input(world: &mut World, events: &mut Vec<GameEvent>) {
    let input = match world.queue.pop_front() { Some(i) => i, None => return };

    let (dx, dy) = input.direction.delta();
    let (x, y) = world.actor.position();
    let (tx, ty) = (x + dx, y + dy);

    let result = world.actor.step(input.direction, &mut world.grid, input.dig_only);

    if result.dug_dirt {
        events.push(GameEvent::DugDirt { x: tx, y: ty });
    }
    if result.collected.is_some() {
        world.gems_collected += 1;
        world.score = world.score.saturating_add(world.scoring.gem);
        events.push(GameEvent::GemCollected { x: tx, y: ty });
    }
    if result.pushed {
        events.push(GameEvent::BoulderPushed { x: tx + dx, y: ty });
    }
    if result.moved {
        events.push(GameEvent::Moved { x: tx, y: ty });
    }

    world.player = world.actor.position();
}

// ══════════════════════════════════════════════════════════════
// Physics + crush
// ══════════════════════════════════════════════════════════════

fn resolve_physics(world: &mut World, events: &mut Vec<GameEvent>) {
    for change in physics::step(&mut world.grid) {
        if change.motion == Motion::Land {
            let (x, y) = change.to;
            events.push(GameEvent::ObjectLanded { x, y, kind: change.kind });
        }
    }
}

/// Returns true if the actor died this tick.
fn resolve_crush(world: &mut World, events: &mut Vec<GameEvent>) -> bool {
    let (x, y) = world.actor.position();
    if !physics::is_dangerous(&world.grid, x, y) { return false; }

    world.actor.die();
    world.status = Status::Dead;
    events.push(GameEvent::PlayerCrushed { x, y });
    log::debug!("level {}: crushed at ({x},{y})", world.level);
    true
}

// ══════════════════════════════════════════════════════════════
// Exit + win
// ══════════════════════════════════════════════════════════════

fn resolve_exit(world: &mut World, events: &mut Vec<GameEvent>) {
    let was_open = world.exit_open;
    world.exit_open = world.gems_collected >= world.gems_required;
    if world.exit_open && !was_open {
        events.push(GameEvent::ExitOpened);
    }
}

fn resolve_win(world: &mut World, events: &mut Vec<GameEvent>) {
    if !world.exit_open || !world.is_player_at_exit() { return; }

    world.status = Status::Won;
    world.score = final_score(world);
    events.push(GameEvent::LevelComplete { score: world.score });
    log::debug!("level {} won, score {}", world.level, world.score);
}
