//! Offline rendering from and to sound files.

use crate::render_core::RenderCore;
use crate::RenderError;
use std::path::Path;
use std::time::{Duration, Instant};
use tascar_audio::{read_wav, Wave, WavSink};
use tascar_core::{ChunkConfig, Transport};
use tascar_scene::{SceneDesc, Session};
use tracing::{info, warn};

/// Counters and timing of the last render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderStats {
    /// Point models that added audio after the warm-up cycle.
    pub active_pointsources: usize,
    /// Total point models.
    pub total_pointsources: usize,
    /// Diffuse models that added audio after the warm-up cycle.
    pub active_diffuse: usize,
    /// Total diffuse models.
    pub total_diffuse: usize,
    /// Frames written to the output file.
    pub frames: usize,
    /// Time spent building the scene and running the warm-up cycle.
    pub prepare_time: Duration,
    /// Time spent rendering fragments.
    pub process_time: Duration,
}

/// Renders one scene of a session offline.
#[derive(Debug, Clone)]
pub struct WavRender {
    session: Session,
    scene: SceneDesc,
    channel_map: Vec<usize>,
    stats: RenderStats,
}

impl WavRender {
    /// Select scene `name` of `session`, or the first scene if `name` is empty.
    pub fn new(session: Session, name: &str) -> Result<Self, RenderError> {
        let scene = session
            .scene(name)
            .cloned()
            .ok_or_else(|| RenderError::UnknownScene(name.to_string()))?;
        Ok(Self {
            session,
            scene,
            channel_map: Vec::new(),
            stats: RenderStats::default(),
        })
    }

    /// Load a session file and select a scene.
    pub fn load(path: impl AsRef<Path>, name: &str) -> Result<Self, RenderError> {
        Self::new(Session::load_file(path)?, name)
    }

    /// Selected scene.
    pub fn scene(&self) -> &SceneDesc {
        &self.scene
    }

    /// Session the scene belongs to.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Input port names.
    pub fn input_ports(&self) -> Vec<String> {
        self.scene.input_ports()
    }

    /// Output port names.
    pub fn output_ports(&self) -> Vec<String> {
        self.scene.output_ports()
    }

    /// Write only these output ports, in this order. An empty map writes all ports.
    pub fn set_channel_map(&mut self, map: Vec<usize>) {
        self.channel_map = map;
    }

    /// Restrict image orders of every receiver to `[min, max]` and build images up to `max`.
    pub fn set_ism_order_range(&mut self, min: u32, max: u32) {
        self.scene.ismorder = max;
        for rec in &mut self.scene.receiver {
            rec.ismmin = min;
            rec.ismmax = max;
        }
    }

    /// Statistics of the last render.
    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    fn output_map(&self) -> Vec<usize> {
        let nch = self.scene.output_ports().len();
        if self.channel_map.is_empty() {
            return (0..nch).collect();
        }
        self.channel_map
            .iter()
            .copied()
            .filter(|ch| {
                if *ch >= nch {
                    warn!(
                        channel = ch,
                        outputs = nch,
                        "Ignoring channel map entry beyond the number of outputs"
                    );
                    false
                } else {
                    true
                }
            })
            .collect()
    }

    /// Build the render core with sound distances limited by `maxdist`, and run one
    /// silent warm-up cycle.
    fn prepare(
        &mut self,
        cfg: &ChunkConfig,
        transport: &Transport,
        maxdist: impl Fn(f64) -> f64,
    ) -> Result<RenderCore, RenderError> {
        let start = Instant::now();
        let mut scene = self.scene.clone();
        for src in &mut scene.source {
            src.sound = src.sounds();
            for snd in &mut src.sound {
                snd.maxdist = maxdist(snd.maxdist);
            }
        }
        let mut core = RenderCore::new(&scene, cfg, &self.session.base_dir)?;
        let inputs = vec![Wave::new(cfg.fragment_size); core.input_ports().len()];
        let mut outputs = vec![Wave::new(cfg.fragment_size); core.output_ports().len()];
        core.process(transport, &inputs, &mut outputs)?;
        self.stats = RenderStats {
            active_pointsources: core.active_pointsources(),
            total_pointsources: core.total_pointsources(),
            active_diffuse: core.active_diffuse(),
            total_diffuse: core.total_diffuse(),
            prepare_time: start.elapsed(),
            ..RenderStats::default()
        };
        info!(
            active = self.stats.active_pointsources,
            total = self.stats.total_pointsources,
            "Point sources after warm-up"
        );
        Ok(core)
    }

    fn finish(&mut self, start: Instant, frames: usize) -> RenderStats {
        self.stats.process_time = start.elapsed();
        self.stats.frames = frames;
        info!(
            frames,
            prepare_ms = self.stats.prepare_time.as_secs_f64() * 1e3,
            process_ms = self.stats.process_time.as_secs_f64() * 1e3,
            "Render finished"
        );
        self.stats.clone()
    }

    /// Render `input` through the scene into `output`.
    ///
    /// Input channels beyond the scene's input ports are ignored, missing
    /// ones are silent. With `dynamic`, time advances from `starttime` with
    /// every fragment; otherwise the scene stays frozen at `starttime`.
    pub fn render_file(
        &mut self,
        fragsize: usize,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        starttime: f64,
        dynamic: bool,
    ) -> Result<RenderStats, RenderError> {
        let file = read_wav(input)?;
        let frames = file.frames();
        let fs = f64::from(file.sample_rate);
        let fragsize = fragsize.min(frames).max(1);
        let cfg = ChunkConfig::new(fs, fragsize, 1);
        let c = self.scene.c;
        let limit = (frames + 1) as f64 / fs * c;
        let mut tp = Transport::at_time(starttime, fs, true);
        let mut core = self.prepare(&cfg, &tp, |d| d.min(limit))?;
        let nin = core.input_ports().len();
        if file.channels.len() != nin {
            warn!(
                file = file.channels.len(),
                inputs = nin,
                "Input file channels do not match the scene inputs"
            );
        }
        let map = self.output_map();
        let mut sink = WavSink::create(output, map.len(), file.sample_rate)?;
        let mut inputs = vec![Wave::new(fragsize); nin];
        let mut outputs = vec![Wave::new(fragsize); core.output_ports().len()];
        let start = Instant::now();
        let mut pos = 0;
        while pos < frames {
            let n = fragsize.min(frames - pos);
            for (k, buf) in inputs.iter_mut().enumerate() {
                match file.channels.get(k) {
                    Some(ch) => buf.copy_from(&ch[pos..pos + n]),
                    None => buf.clear(),
                }
            }
            core.process(&tp, &inputs, &mut outputs)?;
            let block: Vec<Wave> = map
                .iter()
                .map(|ch| Wave::from_vec(outputs[*ch][..n].to_vec()))
                .collect();
            sink.write(&block)?;
            pos += n;
            if dynamic {
                tp.advance(&cfg);
            }
        }
        sink.finalize()?;
        Ok(self.finish(start, frames))
    }

    /// Render the impulse response from input port `inputchannel` to every output.
    ///
    /// The transport is stopped, so the scene is evaluated at `starttime`.
    pub fn render_ir(
        &mut self,
        len: usize,
        fs: f64,
        output: impl AsRef<Path>,
        starttime: f64,
        inputchannel: usize,
    ) -> Result<RenderStats, RenderError> {
        let nin = self.scene.input_ports().len();
        if inputchannel >= nin {
            return Err(RenderError::InputChannel {
                channel: inputchannel,
                inputs: nin,
            });
        }
        let len = len.max(1);
        let cfg = ChunkConfig::new(fs, len, 1);
        let limit = (len + 1) as f64 / fs * self.scene.c;
        let tp = Transport::at_time(starttime, fs, false);
        let mut core = self.prepare(&cfg, &tp, |_| limit)?;
        let map = self.output_map();
        let mut sink = WavSink::create(output, map.len(), fs.round() as u32)?;
        let mut inputs = vec![Wave::new(len); nin];
        inputs[inputchannel][0] = 1.0;
        let mut outputs = vec![Wave::new(len); core.output_ports().len()];
        let start = Instant::now();
        core.process(&tp, &inputs, &mut outputs)?;
        let block: Vec<Wave> = map.iter().map(|ch| outputs[*ch].clone()).collect();
        sink.write(&block)?;
        sink.finalize()?;
        Ok(self.finish(start, len))
    }

    /// Render the scene with silent inputs for `duration` seconds.
    ///
    /// A `duration` of zero uses the session duration.
    pub fn render_duration(
        &mut self,
        fragsize: usize,
        fs: f64,
        duration: f64,
        output: impl AsRef<Path>,
        starttime: f64,
        dynamic: bool,
    ) -> Result<RenderStats, RenderError> {
        let duration = if duration > 0.0 {
            duration
        } else {
            self.session.session.duration
        };
        let total = (duration * fs).round().max(0.0) as usize;
        let fragsize = fragsize.max(1);
        let cfg = ChunkConfig::new(fs, fragsize, 1);
        let limit = duration * self.scene.c;
        let mut tp = Transport::at_time(starttime, fs, true);
        let mut core = self.prepare(&cfg, &tp, |d| d.min(limit))?;
        let map = self.output_map();
        let mut sink = WavSink::create(output, map.len(), fs.round() as u32)?;
        let inputs = vec![Wave::new(fragsize); core.input_ports().len()];
        let mut outputs = vec![Wave::new(fragsize); core.output_ports().len()];
        let start = Instant::now();
        let mut pos = 0;
        while pos < total {
            let n = fragsize.min(total - pos);
            core.process(&tp, &inputs, &mut outputs)?;
            let block: Vec<Wave> = map
                .iter()
                .map(|ch| Wave::from_vec(outputs[*ch][..n].to_vec()))
                .collect();
            sink.write(&block)?;
            pos += n;
            if dynamic {
                tp.advance(&cfg);
            }
        }
        sink.finalize()?;
        Ok(self.finish(start, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tascar_audio::write_wav;

    const SESSION: &str = r#"
        [session]
        duration = 0.01
        [[scene]]
        name = "main"
        [[scene.source]]
        name = "src"
        position = [[0, 1.7, 0, 0]]
        [[scene.source.sound]]
        airabsorption = false
        [[scene.receiver]]
        name = "out"
    "#;

    fn render() -> WavRender {
        WavRender::new(Session::parse_str(SESSION).expect("valid session"), "main")
            .expect("scene exists")
    }

    #[test]
    fn unknown_scene_is_an_error() {
        let session = Session::parse_str(SESSION).expect("valid session");
        assert!(matches!(
            WavRender::new(session, "other"),
            Err(RenderError::UnknownScene(name)) if name == "other"
        ));
    }

    #[test]
    fn ir_channel_is_checked() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = render().render_ir(64, 1000.0, dir.path().join("ir.wav"), 0.0, 1);
        assert!(matches!(
            err,
            Err(RenderError::InputChannel {
                channel: 1,
                inputs: 1
            })
        ));
    }

    #[test]
    fn ir_has_delayed_impulse() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ir.wav");
        let mut wr = render();
        let stats = wr.render_ir(64, 1000.0, &path, 0.0, 0).expect("render");
        assert_eq!(stats.frames, 64);
        assert_eq!(stats.total_pointsources, 1);
        let ir = read_wav(&path).expect("readable");
        assert_eq!(ir.frames(), 64);
        // 1.7 m at 1 kHz and 340 m/s is 5 samples.
        assert!((ir.channels[0][5] - 1.0 / 1.7).abs() < 1e-5);
        assert_eq!(ir.channels[0][4], 0.0);
    }

    #[test]
    fn file_render_writes_every_frame() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        let mut x = Wave::new(100);
        x[0] = 1.0;
        write_wav(&input, &[x], 1000).expect("writable");
        let mut wr = render();
        wr.set_channel_map(vec![0, 3]);
        let stats = wr.render_file(32, &input, &output, 0.0, true).expect("render");
        assert_eq!(stats.frames, 100);
        let out = read_wav(&output).expect("readable");
        assert_eq!(out.channels.len(), 1);
        assert_eq!(out.frames(), 100);
        assert!(out.channels[0][5] > 0.5);
    }

    #[test]
    fn duration_defaults_to_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("silence.wav");
        let stats = render()
            .render_duration(4, 1000.0, 0.0, &path, 0.0, true)
            .expect("render");
        assert_eq!(stats.frames, 10);
        let out = read_wav(&path).expect("readable");
        assert_eq!(out.frames(), 10);
        assert_eq!(out.channels[0].maxabs(), 0.0);
    }
}
