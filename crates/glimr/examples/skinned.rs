//! A skinned glTF character playing its first clip over a lit floor.
//!
//! `1`..`9` pick a clip, `L` toggles a loop range over the middle of the
//! clip, `P` pauses, mouse and `WASD` move the camera.

use std::path::Path;

use glimr::prelude::*;
use glimr::render3d::shapes;

const MODEL_PATH: &str = "assets/models/character/scene.gltf";
const SKY_PATH: &str = "assets/hdri/studio.hdr";

const CLIP_KEYS: [KeyCode; 9] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

struct Skinned {
    renderer: Renderer3d,
    scene: Scene,
    camera: FpsCamera,
    model: ModelHandle,
    /// Playback clock, restarted whenever a clip is picked.
    clock: f32,
    paused: bool,
}

impl Skinned {
    fn toggle_loop_range(&mut self) {
        let rig = &mut self.renderer.model_mut(self.model).rig;
        if rig.loop_range().is_some() {
            rig.disable_animation_loop_range();
            log::info!("Loop range off");
            return;
        }
        let Some(clip) = rig.current_animation() else {
            return;
        };
        let seconds = clip.duration / clip.ticks_per_second;
        // An invalid range is already logged and leaves full-clip looping on.
        if rig.set_animation_loop_range(seconds * 0.25, seconds * 0.75).is_ok() {
            log::info!("Looping {:.2}s..{:.2}s", seconds * 0.25, seconds * 0.75);
        }
    }
}

impl Sample for Skinned {
    fn init(gpu: &GpuContext) -> glimr::Result<Self> {
        let mut renderer = Renderer3d::new(gpu, RendererConfig::default());
        renderer.load_sky(gpu, Path::new(SKY_PATH));

        let model = renderer.load_model(gpu, Path::new(MODEL_PATH), &ImportOptions::default());
        {
            let rig = &mut renderer.model_mut(model).rig;
            log::info!("Clips: {:?}", rig.animation_names());
            if !rig.clips().is_empty() {
                rig.play(0);
            }
        }

        let (mut vertices, mut indices) = (Vec::new(), Vec::new());
        shapes::plane(20.0, 20.0, 1, 1, 4.0, 4.0, &mut vertices, &mut indices);
        let floor = renderer.meshes.upload(gpu, &vertices, &indices);
        let floor_material = renderer.add_material(
            gpu,
            Material::from_albedo(Vec3::new(0.4, 0.42, 0.45)).with_metallic_roughness(0.0, 0.8),
        );

        let mut scene = Scene::new(DirectionalLight::default());
        scene.add(SceneObject::mesh(Transform::IDENTITY, floor, floor_material));
        scene.add(SceneObject::model(Transform::IDENTITY.with_scale(0.01), model));

        Ok(Self {
            renderer,
            scene,
            camera: FpsCamera::new(Vec3::new(0.0, 1.5, 4.0), -90.0, -10.0),
            model,
            clock: 0.0,
            paused: false,
        })
    }

    fn update(&mut self, ctx: &UpdateContext<'_>) {
        self.camera.apply_input(ctx.keys, ctx.time.delta_secs());
        self.camera.process_mouse(ctx.pointer.motion.x, ctx.pointer.motion.y);

        if let Some(index) = CLIP_KEYS.iter().position(|&key| ctx.keys.just_pressed(key)) {
            let rig = &mut self.renderer.model_mut(self.model).rig;
            if index < rig.clips().len() {
                rig.play(index);
                self.clock = 0.0;
            }
        }
        if ctx.keys.just_pressed(KeyCode::KeyL) {
            self.toggle_loop_range();
        }
        if ctx.keys.just_pressed(KeyCode::KeyP) {
            self.paused = !self.paused;
        }

        if !self.paused {
            self.clock += ctx.time.delta_secs();
        }
        self.renderer.update_animations(self.clock);
    }

    fn render(&mut self, frame: &mut FrameContext<'_>) {
        self.renderer.render(frame, &self.scene, &self.camera);
    }
}

fn main() -> glimr::Result<()> {
    glimr::app::run::<Skinned>(WindowConfig {
        grab_cursor: true,
        ..WindowConfig::titled("glimr - skinned")
    })
}
