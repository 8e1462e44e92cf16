//! HDRI-lit PBR spheres over a ground plane, with cascaded shadows and a
//! glass sphere drawn in the transparent pass.
//!
//! `WASD`/`Space`/`Shift` fly, mouse looks, `C` toggles single/cascaded
//! shadows.

use std::path::Path;

use glimr::prelude::*;
use glimr::render3d::shapes;

const SKY_PATH: &str = "assets/hdri/newport_loft.hdr";
const GROUND_TEXTURE: &str = "assets/textures/ground_albedo.png";

/// Spheres per row of the metallic/roughness grid.
const GRID: u32 = 5;

struct PbrScene {
    renderer: Renderer3d,
    scene: Scene,
    camera: FpsCamera,
    cascaded: bool,
}

impl PbrScene {
    fn set_shadow_mode(&mut self, cascaded: bool) {
        self.cascaded = cascaded;
        let defaults = if cascaded {
            RendererConfig::cascaded()
        } else {
            RendererConfig::default()
        };
        self.renderer.config.cascade_ends = defaults.cascade_ends;
        log::info!(
            "Shadows: {} cascade(s)",
            self.renderer.config.cascade_count()
        );
    }
}

impl Sample for PbrScene {
    fn init(gpu: &GpuContext) -> glimr::Result<Self> {
        let mut renderer = Renderer3d::new(gpu, RendererConfig::cascaded());
        renderer.load_sky(gpu, Path::new(SKY_PATH));

        let (mut vertices, mut indices) = (Vec::new(), Vec::new());
        shapes::sphere(0.5, 48, 48, &mut vertices, &mut indices);
        let sphere = renderer.meshes.upload(gpu, &vertices, &indices);
        shapes::plane(40.0, 40.0, 1, 1, 8.0, 8.0, &mut vertices, &mut indices);
        let ground = renderer.meshes.upload(gpu, &vertices, &indices);
        shapes::cube(1.0, &mut vertices, &mut indices);
        let cube = renderer.meshes.upload(gpu, &vertices, &indices);

        let ground_map = match renderer.load_texture(gpu, Path::new(GROUND_TEXTURE), true) {
            Ok(handle) => Some(handle),
            Err(err) => {
                log::warn!("{err}; ground stays untextured");
                None
            }
        };
        let ground_material = renderer.add_material(
            gpu,
            Material {
                albedo_map: ground_map,
                reflection_strength: 0.2,
                ..Material::from_albedo(Vec3::splat(0.6)).with_metallic_roughness(0.0, 0.9)
            },
        );

        let mut scene = Scene::new(DirectionalLight::default());
        scene.add(SceneObject::mesh(Transform::from_xyz(0.0, -1.0, 0.0), ground, ground_material));

        for row in 0..GRID {
            for column in 0..GRID {
                let metallic = row as f32 / (GRID - 1) as f32;
                let roughness = (column as f32 / (GRID - 1) as f32).clamp(0.05, 1.0);
                let material = renderer.add_material(
                    gpu,
                    Material::from_albedo(Vec3::new(0.9, 0.2, 0.15)).with_metallic_roughness(metallic, roughness),
                );
                let x = (column as f32 - (GRID - 1) as f32 * 0.5) * 1.4;
                let y = row as f32 * 1.4;
                scene.add(SceneObject::mesh(Transform::from_xyz(x, y, -4.0), sphere, material));
            }
        }

        let gold = renderer.add_material(
            gpu,
            Material::from_albedo(Vec3::new(1.0, 0.78, 0.34)).with_metallic_roughness(1.0, 0.3),
        );
        scene.add(SceneObject::mesh(
            Transform::from_xyz(3.0, -0.25, 2.0)
                .with_scale(1.5)
                .with_rotation(Vec3::new(0.0, 35f32.to_radians(), 0.0)),
            cube,
            gold,
        ));

        let glass = renderer.add_material(gpu, Material::glass(1.52));
        scene.add(SceneObject::mesh(Transform::from_xyz(-2.0, 0.0, 2.0).with_scale(2.0), sphere, glass));

        Ok(Self {
            renderer,
            scene,
            camera: FpsCamera::new(Vec3::new(0.0, 2.0, 10.0), -90.0, -10.0),
            cascaded: true,
        })
    }

    fn update(&mut self, ctx: &UpdateContext<'_>) {
        self.camera.apply_input(ctx.keys, ctx.time.delta_secs());
        self.camera.process_mouse(ctx.pointer.motion.x, ctx.pointer.motion.y);
        if ctx.keys.just_pressed(KeyCode::KeyC) {
            self.set_shadow_mode(!self.cascaded);
        }
    }

    fn render(&mut self, frame: &mut FrameContext<'_>) {
        self.renderer.render(frame, &self.scene, &self.camera);
    }
}

fn main() -> glimr::Result<()> {
    glimr::app::run::<PbrScene>(WindowConfig {
        grab_cursor: true,
        ..WindowConfig::titled("glimr - pbr scene")
    })
}
