//! Brick breaker on the instanced entity runtime.
//!
//! Move the mouse to steer the paddle. `R` restarts, `Esc` quits.

use glimr::game;
use glimr::prelude::*;

/// Overrides applied on top of the compiled-in arena defaults.
const ARENA_OVERRIDES: &str = r#"{ "lives": 3, "max_speed": 20.0 }"#;

struct Arkanoid {
    config: ArenaConfig,
    registry: Registry,
    state: GameState,
    renderer: InstancedRenderer,
    view_projection: Mat4,
    reported_end: bool,
}

impl Arkanoid {
    fn restart(&mut self) {
        self.registry = Registry::new();
        game::spawn_arena(&mut self.registry, &self.config);
        self.state = GameState::new(self.config.lives);
        self.reported_end = false;
    }
}

fn camera_matrix(aspect: f32) -> Mat4 {
    let projection = Mat4::perspective_rh(45f32.to_radians(), aspect, 0.1, 100.0);
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 28.0), Vec3::ZERO, Vec3::Y);
    projection * view
}

impl Sample for Arkanoid {
    fn init(gpu: &GpuContext) -> glimr::Result<Self> {
        let config = ArenaConfig::from_json(ARENA_OVERRIDES)?;
        let mut registry = Registry::new();
        game::spawn_arena(&mut registry, &config);
        Ok(Self {
            state: GameState::new(config.lives),
            renderer: InstancedRenderer::new(gpu),
            view_projection: camera_matrix(gpu.aspect_ratio()),
            config,
            registry,
            reported_end: false,
        })
    }

    fn update(&mut self, ctx: &UpdateContext<'_>) {
        if ctx.keys.just_pressed(KeyCode::KeyR) {
            self.restart();
        }

        let input = GameInput {
            cursor_x: ctx.pointer.position.x,
            window_width: ctx.size.0 as f32,
            dt: ctx.time.clamped_delta_secs(),
        };
        game::step(&mut self.registry, &mut self.state, &self.config, &input);

        if !self.state.running && !self.reported_end {
            self.reported_end = true;
            log::info!(
                "Game over: score {} ({} bricks), press R to restart",
                self.state.score,
                self.state.bricks_destroyed
            );
        }
    }

    fn render(&mut self, frame: &mut FrameContext<'_>) {
        self.renderer.render(frame, &mut self.registry, &self.view_projection);
    }

    fn resize(&mut self, _gpu: &GpuContext, width: u32, height: u32) {
        self.view_projection = camera_matrix(width as f32 / height.max(1) as f32);
    }
}

fn main() -> glimr::Result<()> {
    glimr::app::run::<Arkanoid>(WindowConfig::titled("glimr - arkanoid"))
}
