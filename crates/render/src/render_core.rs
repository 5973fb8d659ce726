//! Port-level rendering of one scene.

use crate::world::World;
use crate::RenderError;
use std::path::Path;
use tascar_audio::Wave;
use tascar_core::{make_friendly_number, ChunkConfig, Transport};
use tascar_scene::SceneDesc;
use tracing::info;

/// Renders one scene from input port buffers to output port buffers.
///
/// Input ports are one per sound, in source and sound order, followed by
/// W, X, Y, Z of every diffuse field. Output ports are the receiver
/// channels in receiver order.
#[derive(Debug)]
pub struct RenderCore {
    world: World,
    cfg: ChunkConfig,
    name: String,
    active: bool,
    input_ports: Vec<String>,
    output_ports: Vec<String>,
}

impl RenderCore {
    /// Build the renderer of `scene` for block configuration `cfg`.
    pub fn new(scene: &SceneDesc, cfg: &ChunkConfig, base_dir: &Path) -> Result<Self, RenderError> {
        let world = World::new(scene, cfg, base_dir)?;
        let input_ports = scene.input_ports();
        let output_ports = scene.output_ports();
        info!(
            scene = %scene.name,
            inputs = input_ports.len(),
            outputs = output_ports.len(),
            point = world.total_pointsources(),
            diffuse = world.total_diffuse(),
            "Prepared scene"
        );
        Ok(Self {
            world,
            cfg: *cfg,
            name: scene.name.clone(),
            active: scene.active,
            input_ports,
            output_ports,
        })
    }

    /// Scene name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block configuration.
    pub fn config(&self) -> &ChunkConfig {
        &self.cfg
    }

    /// Input port names.
    pub fn input_ports(&self) -> &[String] {
        &self.input_ports
    }

    /// Output port names.
    pub fn output_ports(&self) -> &[String] {
        &self.output_ports
    }

    /// The world with all objects.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, e.g. to change object flags between fragments.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Total number of point models.
    pub fn total_pointsources(&self) -> usize {
        self.world.total_pointsources()
    }

    /// Point models that added audio in the last fragment.
    pub fn active_pointsources(&self) -> usize {
        self.world.active_pointsources()
    }

    /// Total number of diffuse models.
    pub fn total_diffuse(&self) -> usize {
        self.world.total_diffuse()
    }

    /// Diffuse models that added audio in the last fragment.
    pub fn active_diffuse(&self) -> usize {
        self.world.active_diffuse()
    }

    /// Input levels in dB SPL, in input port order.
    pub fn input_levels(&self) -> Vec<f32> {
        let mut levels: Vec<f32> = self
            .world
            .sources
            .iter()
            .flat_map(|src| src.sounds.iter().map(|snd| snd.level()))
            .collect();
        for field in &self.world.diffuse {
            levels.extend([field.level(); 4]);
        }
        levels
    }

    /// Render one fragment.
    ///
    /// `inputs` and `outputs` must have one buffer per port; shorter
    /// input buffers are zero-padded.
    pub fn process(
        &mut self,
        transport: &Transport,
        inputs: &[Wave],
        outputs: &mut [Wave],
    ) -> Result<(), RenderError> {
        if inputs.len() != self.input_ports.len() {
            return Err(RenderError::BufferCount {
                what: "input",
                expected: self.input_ports.len(),
                got: inputs.len(),
            });
        }
        if outputs.len() != self.output_ports.len() {
            return Err(RenderError::BufferCount {
                what: "output",
                expected: self.output_ports.len(),
                got: outputs.len(),
            });
        }
        for out in outputs.iter_mut() {
            out.clear();
        }
        if !self.active {
            return Ok(());
        }
        let t = transport.session_time_seconds;
        self.world.geometry_update(t);
        self.world.process_active(t);
        let mut port = 0;
        for src in &mut self.world.sources {
            for snd in &mut src.sounds {
                snd.set_input(&inputs[port]);
                port += 1;
            }
        }
        for field in &mut self.world.diffuse {
            let ch = &inputs[port..port + 4];
            field.set_input([&ch[0], &ch[1], &ch[2], &ch[3]]);
            port += 4;
        }
        self.world.process(transport);
        let mut port = 0;
        for rec in &self.world.receivers {
            for ch in &rec.outputs {
                let out = &mut outputs[port];
                out.add_scaled(ch, rec.gain);
                for v in out.iter_mut() {
                    *v = make_friendly_number(*v);
                }
                port += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tascar_scene::Session;

    const SCENE: &str = r#"
        [[scene]]
        [[scene.source]]
        name = "src"
        position = [[0, 1, 0, 0]]
        [[scene.source.sound]]
        name = "a"
        airabsorption = false
        delayline = false
        [[scene.source.sound]]
        name = "b"
        [[scene.diffuse]]
        name = "amb"
        [[scene.receiver]]
        name = "out"
        gain = -6.0206
    "#;

    fn core() -> RenderCore {
        let session = Session::parse_str(SCENE).expect("valid session");
        RenderCore::new(&session.scene[0], &ChunkConfig::new(1000.0, 8, 1), &session.base_dir)
            .expect("valid scene")
    }

    #[test]
    fn ports_follow_scene_order() {
        let core = core();
        assert_eq!(
            core.input_ports(),
            &["src.a", "src.b", "amb.0w", "amb.1x", "amb.1y", "amb.1z"]
        );
        assert_eq!(core.output_ports(), &["out.0"]);
        assert_eq!(core.input_levels().len(), 6);
    }

    #[test]
    fn buffer_counts_are_checked() {
        let mut core = core();
        let mut out = vec![Wave::new(8)];
        let err = core.process(&Transport::default(), &[Wave::new(8)], &mut out);
        assert!(matches!(
            err,
            Err(RenderError::BufferCount {
                what: "input",
                expected: 6,
                got: 1
            })
        ));
    }

    #[test]
    fn receiver_gain_scales_output() {
        let mut core = core();
        let mut inputs = vec![Wave::new(8); 6];
        inputs[0].copy_from(&[1.0; 8]);
        let mut out = vec![Wave::new(8)];
        let tp = Transport::default();
        core.process(&tp, &inputs, &mut out).expect("process");
        core.process(&tp, &inputs, &mut out).expect("process");
        // 1 m distance, no delay, receiver gain -6 dB.
        assert!((out[0][7] - 0.5).abs() < 1e-4);
        assert_eq!(core.active_pointsources(), 2);
    }
}
