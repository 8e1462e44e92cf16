//! # Systems — Paddle, Ball and Death Handling
//!
//! Plain functions over the [`Registry`], run once per frame in this order:
//!
//! ```text
//! paddle_control ─► ball_physics ─► handle_death
//! ```
//!
//! [`step`] runs all three and is what samples call. Every reflection (wall,
//! paddle or brick) multiplies the ball velocity by
//! [`ArenaConfig::speed_up`] and clamps its length to
//! [`ArenaConfig::max_speed`].

use glam::{Vec2, Vec3, Vec3Swizzles};

use super::collision::{Axis, aabb_circle};
use super::components::{Ball, Brick, GameInput, GameState, Paddle, Shape, Tint, Velocity};
use super::config::ArenaConfig;
use crate::ecs::{Entity, Registry};
use crate::math::Transform;

/// Depth of every arena box along Z.
const BOX_DEPTH: f32 = 0.5;

/// Handles to the long-lived arena entities.
#[derive(Debug, Clone, Copy)]
pub struct Arena {
    pub paddle: Entity,
    pub ball: Entity,
}

/// Spawn the paddle, the ball and the full brick grid.
pub fn spawn_arena(registry: &mut Registry, config: &ArenaConfig) -> Arena {
    let paddle = registry.create();
    registry.add(
        paddle,
        Transform::from_xyz(config.paddle_start.x, config.paddle_start.y, 0.0)
            .with_scale_xyz(config.paddle_size.extend(BOX_DEPTH)),
    );
    registry.add(
        paddle,
        Paddle {
            half_width: config.paddle_half_width(),
        },
    );
    registry.add(paddle, Shape::Cube);
    registry.add(paddle, Tint(config.paddle_color));

    let ball = registry.create();
    registry.add(
        ball,
        Transform::from_xyz(config.ball_start.x, config.ball_start.y, 0.0)
            .with_scale(config.ball_radius * 2.0),
    );
    registry.add(ball, Velocity(config.ball_start_velocity));
    registry.add(
        ball,
        Ball {
            radius: config.ball_radius,
        },
    );
    registry.add(ball, Shape::Sphere);
    registry.add(ball, Tint(config.ball_color));

    for row in 0..config.brick_rows {
        for column in 0..config.brick_columns {
            let centre = config.brick_center(row, column);
            let brick = registry.create();
            registry.add(
                brick,
                Transform::from_xyz(centre.x, centre.y, 0.0)
                    .with_scale_xyz(config.brick_size.extend(BOX_DEPTH)),
            );
            registry.add(brick, Brick { row, column });
            registry.add(brick, Shape::Cube);
            registry.add(brick, Tint(config.brick_color(row)));
        }
    }

    log::info!(
        "Arena spawned: {} bricks, {} lives",
        config.brick_rows * config.brick_columns,
        config.lives
    );

    Arena { paddle, ball }
}

/// Run one frame of game logic. Does nothing once the game has ended.
pub fn step(registry: &mut Registry, state: &mut GameState, config: &ArenaConfig, input: &GameInput) {
    if !state.running {
        return;
    }
    paddle_control(registry, config, input);
    let lost = ball_physics(registry, state, config, input.dt);
    handle_death(registry, state, config, lost);
}

/// Map cursor X to world X and ease the paddle toward it.
pub fn paddle_control(registry: &mut Registry, config: &ArenaConfig, input: &GameInput) {
    let width = input.window_width.max(1.0);
    let t = (input.cursor_x / width).clamp(0.0, 1.0);
    let target = config.min_x + (config.max_x - config.min_x) * t;

    registry.view::<(&Paddle, &mut Transform)>(|_, (paddle, transform)| {
        let x = &mut transform.translation.x;
        *x += (target - *x) * config.paddle_smoothness * input.dt;
        *x = x.clamp(config.min_x + paddle.half_width, config.max_x - paddle.half_width);
    });
}

/// Integrate every ball, bounce it off walls, the paddle and bricks.
///
/// Returns `true` when a ball crossed the bottom of the arena this frame.
pub fn ball_physics(registry: &mut Registry, state: &mut GameState, config: &ArenaConfig, dt: f32) -> bool {
    let mut paddle_box: Option<(Vec2, Vec2, f32)> = None;
    registry.view::<(&Paddle, &Transform)>(|_, (paddle, t)| {
        paddle_box = Some((t.translation.xy(), t.scale.xy(), paddle.half_width));
    });

    let balls: Vec<Entity> = registry
        .array::<Ball>()
        .map(|array| array.iter().map(|(e, _)| e).collect())
        .unwrap_or_default();

    let mut lost = false;
    for entity in balls {
        let (Some(&ball), Some(&transform), Some(&velocity)) = (
            registry.get::<Ball>(entity),
            registry.get::<Transform>(entity),
            registry.get::<Velocity>(entity),
        ) else {
            continue;
        };

        let r = ball.radius;
        let mut pos = transform.translation.xy() + velocity.0 * dt;
        let mut vel = velocity.0;
        let mut reflections = 0u32;

        // Walls. The bottom one is a death, not a bounce.
        if pos.x - r < config.min_x {
            pos.x = config.min_x + r;
            vel.x = vel.x.abs();
            reflections += 1;
        } else if pos.x + r > config.max_x {
            pos.x = config.max_x - r;
            vel.x = -vel.x.abs();
            reflections += 1;
        }
        if pos.y + r > config.max_y {
            pos.y = config.max_y - r;
            vel.y = -vel.y.abs();
            reflections += 1;
        }
        if pos.y - r < config.min_y {
            lost = true;
        }

        // Paddle: only while falling, so a ball resting on it can't stick.
        if let Some((centre, size, half_width)) = paddle_box {
            if vel.y < 0.0 && aabb_circle(centre, size, pos, r).is_some() {
                vel.y = vel.y.abs();
                pos.y = centre.y + size.y * 0.5 + r;
                vel.x += (pos.x - centre.x) / half_width * config.paddle_spin;
                reflections += 1;
            }
        }

        // Bricks: destroy everything touched, reflect once off the deepest hit.
        let mut hits = Vec::new();
        registry.view::<(&Brick, &Transform)>(|brick, (_, t)| {
            if let Some(contact) = aabb_circle(t.translation.xy(), t.scale.xy(), pos, r) {
                hits.push((brick, contact));
            }
        });
        let deepest = hits
            .iter()
            .map(|(_, c)| *c)
            .min_by(|a, b| a.relative.length_squared().total_cmp(&b.relative.length_squared()));
        if let Some(contact) = deepest {
            match contact.reflect_axis() {
                Axis::X => vel.x = vel.x.abs() * contact.normal.x.signum(),
                Axis::Y => vel.y = vel.y.abs() * contact.normal.y.signum(),
            }
            reflections += 1;
        }
        for (brick, _) in &hits {
            registry.destroy(*brick);
            state.score += config.score_per_brick;
            state.bricks_destroyed += 1;
        }

        for _ in 0..reflections {
            vel *= config.speed_up;
        }
        vel = vel.clamp_length_max(config.max_speed);

        if let Some(t) = registry.get_mut::<Transform>(entity) {
            t.translation = Vec3::new(pos.x, pos.y, t.translation.z);
        }
        if let Some(v) = registry.get_mut::<Velocity>(entity) {
            v.0 = vel;
        }
    }
    lost
}

/// Lose a life when the ball fell out; reset or end the game.
pub fn handle_death(registry: &mut Registry, state: &mut GameState, config: &ArenaConfig, lost: bool) {
    if !lost {
        return;
    }
    state.lives = state.lives.saturating_sub(1);
    if state.lives == 0 {
        state.running = false;
        log::info!("Game over, final score {}", state.score);
        return;
    }
    log::info!("Ball lost, {} lives left", state.lives);
    reset_positions(registry, config);
}

/// Put the ball and paddle back at their starting positions.
pub fn reset_positions(registry: &mut Registry, config: &ArenaConfig) {
    registry.view::<(&Ball, &mut Transform, &mut Velocity)>(|_, (_, t, v)| {
        t.translation = config.ball_start.extend(t.translation.z);
        v.0 = config.ball_start_velocity;
    });
    registry.view::<(&Paddle, &mut Transform)>(|_, (_, t)| {
        t.translation = config.paddle_start.extend(t.translation.z);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(cursor_x: f32) -> GameInput {
        GameInput {
            cursor_x,
            window_width: 1000.0,
            dt: 1.0 / 60.0,
        }
    }

    fn bricks_left(registry: &Registry) -> u32 {
        registry.count::<Brick>() as u32
    }

    #[test]
    fn spawn_counts() {
        let cfg = ArenaConfig::default();
        let mut reg = Registry::new();
        spawn_arena(&mut reg, &cfg);
        assert_eq!(bricks_left(&reg), 300);
        assert_eq!(reg.count::<Ball>(), 1);
        assert_eq!(reg.count::<Paddle>(), 1);
        assert_eq!(reg.count::<Tint>(), 302);
    }

    #[test]
    fn paddle_stays_inside_walls() {
        let cfg = ArenaConfig::default();
        let mut reg = Registry::new();
        let arena = spawn_arena(&mut reg, &cfg);
        let hw = cfg.paddle_half_width();
        for cursor in [-5000.0, 0.0, 500.0, 1000.0, 9000.0] {
            for _ in 0..240 {
                paddle_control(&mut reg, &cfg, &input(cursor));
                let x = reg.get::<Transform>(arena.paddle).unwrap().translation.x;
                assert!(x >= cfg.min_x + hw - 1e-5 && x <= cfg.max_x - hw + 1e-5);
            }
        }
        let x = reg.get::<Transform>(arena.paddle).unwrap().translation.x;
        assert!((x - (cfg.max_x - hw)).abs() < 1e-3);
    }

    #[test]
    fn paddle_follows_cursor_centre() {
        let cfg = ArenaConfig::default();
        let mut reg = Registry::new();
        let arena = spawn_arena(&mut reg, &cfg);
        reg.get_mut::<Transform>(arena.paddle).unwrap().translation.x = 10.0;
        for _ in 0..240 {
            paddle_control(&mut reg, &cfg, &input(500.0));
        }
        let x = reg.get::<Transform>(arena.paddle).unwrap().translation.x;
        assert!(x.abs() < 1e-3);
    }

    #[test]
    fn ball_bounces_off_side_wall_with_speed_up() {
        let cfg = ArenaConfig::default();
        let mut reg = Registry::new();
        let mut state = GameState::new(cfg.lives);
        let ball = reg.create();
        reg.add(ball, Ball { radius: 0.5 });
        reg.add(ball, Transform::from_xyz(cfg.max_x - 0.55, 0.0, 0.0));
        reg.add(ball, Velocity(Vec2::new(6.0, 0.0)));

        let lost = ball_physics(&mut reg, &mut state, &cfg, 0.1);
        assert!(!lost);
        let v = reg.get::<Velocity>(ball).unwrap().0;
        assert!((v.x + 6.0 * cfg.speed_up).abs() < 1e-4);
        let x = reg.get::<Transform>(ball).unwrap().translation.x;
        assert!((x - (cfg.max_x - 0.5)).abs() < 1e-5);
    }

    #[test]
    fn paddle_hit_sends_ball_up_with_spin() {
        let cfg = ArenaConfig::default();
        let mut reg = Registry::new();
        let mut state = GameState::new(cfg.lives);
        let arena = spawn_arena(&mut reg, &cfg);
        let paddle_top = cfg.paddle_start.y + cfg.paddle_size.y * 0.5;
        reg.get_mut::<Transform>(arena.ball).unwrap().translation =
            Vec3::new(1.0, paddle_top + cfg.ball_radius * 0.5, 0.0);
        reg.get_mut::<Velocity>(arena.ball).unwrap().0 = Vec2::new(0.0, -5.0);

        ball_physics(&mut reg, &mut state, &cfg, 0.0);
        let v = reg.get::<Velocity>(arena.ball).unwrap().0;
        assert!(v.y > 0.0);
        assert!(v.x > 0.0, "hit right of centre should push right");
        let y = reg.get::<Transform>(arena.ball).unwrap().translation.y;
        assert!((y - (paddle_top + cfg.ball_radius)).abs() < 1e-5);
    }

    #[test]
    fn speed_never_exceeds_max() {
        let cfg = ArenaConfig::default();
        let mut reg = Registry::new();
        let mut state = GameState::new(cfg.lives);
        let arena = spawn_arena(&mut reg, &cfg);
        reg.get_mut::<Velocity>(arena.ball).unwrap().0 = Vec2::new(17.0, 11.0);
        for frame in 0..2000 {
            let cursor = (frame % 100) as f32 * 10.0;
            step(&mut reg, &mut state, &cfg, &input(cursor));
            if let Some(v) = reg.get::<Velocity>(arena.ball) {
                assert!(v.0.length() <= cfg.max_speed + 1e-4);
            }
            if !state.running {
                break;
            }
        }
    }

    #[test]
    fn brick_destruction_until_game_over() {
        // Ball fired straight up through the grid centre with the paddle
        // parked at the far right so every return trip is a lost life.
        let cfg = ArenaConfig::default();
        let mut reg = Registry::new();
        let mut state = GameState::new(cfg.lives);
        spawn_arena(&mut reg, &cfg);
        let far_right = input(1000.0);

        let mut frames = 0;
        while state.running && frames < 60 * 120 {
            step(&mut reg, &mut state, &cfg, &far_right);
            frames += 1;
        }

        assert!(!state.running, "game should end within two minutes");
        assert_eq!(state.lives, 0);
        let destroyed = 300 - bricks_left(&reg);
        assert!(destroyed > 0);
        assert_eq!(destroyed, state.bricks_destroyed);
        assert_eq!(state.score, 100 * destroyed);
    }

    #[test]
    fn death_resets_positions() {
        let cfg = ArenaConfig::default();
        let mut reg = Registry::new();
        let mut state = GameState::new(2);
        let arena = spawn_arena(&mut reg, &cfg);
        reg.get_mut::<Transform>(arena.ball).unwrap().translation = Vec3::new(4.0, cfg.min_y - 1.0, 0.0);
        reg.get_mut::<Transform>(arena.paddle).unwrap().translation.x = 7.0;

        handle_death(&mut reg, &mut state, &cfg, true);
        assert_eq!(state.lives, 1);
        assert!(state.running);
        let ball = reg.get::<Transform>(arena.ball).unwrap().translation;
        assert_eq!(ball.xy(), cfg.ball_start);
        let paddle = reg.get::<Transform>(arena.paddle).unwrap().translation;
        assert_eq!(paddle.xy(), cfg.paddle_start);

        handle_death(&mut reg, &mut state, &cfg, true);
        assert_eq!(state.lives, 0);
        assert!(!state.running);
    }
}
