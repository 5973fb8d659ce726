//! Subcommand implementations of the `tascar` binary.

use crate::about::TASCAR;
use crate::config::RenderConfig;
use anyhow::{bail, Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tascar_audio::read_wav;
use tascar_render::{RenderStats, WavRender};
use tascar_scene::Session;
use tascar_testkit::{
    MetricsReportBuilder, MetricsSink, RenderMetrics, TestExecutionMetrics, TestResult,
};
use tracing::info;

/// Minimal session with one source, one reflecting wall and a stereo
/// receiver. Written by `tascar skeleton`.
pub const SKELETON: &str = r#"[session]
name = "skeleton"
duration = 10
license = "CC0"

[[scene]]
name = "main"
c = 340
ismorder = 1

[[scene.source]]
name = "src"
position = [[0, 2, 1, 0], [10, 2, -1, 0]]

[[scene.source.sound]]
name = "0"
gain = 0

[[scene.receiver]]
name = "out"
type = "amb1h0v"

[[scene.receiver]]
name = "stereo"
type = "vbap"
speaker = [{ az = 30 }, { az = -30 }]

[[scene.face]]
name = "floor"
position = [[0, -5, -5, -1.5]]
orientation = [[0, 0, -90, 0]]
width = 10
height = 10
reflectivity = 0.7
damping = 0.2
"#;

/// Options shared by the file based render commands.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub scene: String,
    pub starttime: f64,
    pub channels: Vec<usize>,
    pub ism_range: Option<(u32, u32)>,
}

fn output_file(cfg: &RenderConfig, output: &Path) -> Result<PathBuf> {
    let output = cfg.output_path(output);
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    Ok(output)
}

fn open(session: &Path, opts: &RenderOptions) -> Result<WavRender> {
    let mut wr = WavRender::load(session, &opts.scene)
        .with_context(|| format!("failed to open scene of {}", session.display()))?;
    wr.set_channel_map(opts.channels.clone());
    if let Some((min, max)) = opts.ism_range {
        if min > max {
            bail!("ism range {min}..{max} is empty");
        }
        wr.set_ism_order_range(min, max);
    }
    Ok(wr)
}

/// Render a sound file, or silence for a fixed duration when `input` is `None`.
#[allow(clippy::too_many_arguments)]
pub fn render_file(
    cfg: &RenderConfig,
    session: &Path,
    input: Option<&Path>,
    output: &Path,
    fragsize: Option<usize>,
    duration: f64,
    fs: Option<f64>,
    dynamic: bool,
    opts: &RenderOptions,
) -> Result<PathBuf> {
    let output = output_file(cfg, output)?;
    let fragsize = fragsize.unwrap_or(cfg.fragsize);
    let fs = fs.unwrap_or(cfg.sample_rate);
    let mut wr = open(session, opts)?;
    let started = Instant::now();
    let stats = match input {
        Some(input) => wr
            .render_file(fragsize, input, &output, opts.starttime, dynamic)
            .with_context(|| format!("failed to render {}", input.display()))?,
        None => wr
            .render_duration(fragsize, fs, duration, &output, opts.starttime, dynamic)
            .context("failed to render scene")?,
    };
    info!(output = %output.display(), frames = stats.frames, "Wrote rendered scene");
    if cfg.write_metrics {
        write_metrics(&output, "renderfile", &stats, started)?;
    }
    Ok(output)
}

/// Render the impulse response of one input port.
pub fn render_ir(
    cfg: &RenderConfig,
    session: &Path,
    output: &Path,
    len: usize,
    fs: f64,
    inputchannel: usize,
    opts: &RenderOptions,
) -> Result<PathBuf> {
    let output = output_file(cfg, output)?;
    let mut wr = open(session, opts)?;
    let started = Instant::now();
    let stats = wr
        .render_ir(len, fs, &output, opts.starttime, inputchannel)
        .context("failed to render impulse response")?;
    info!(output = %output.display(), len, "Wrote impulse response");
    if cfg.write_metrics {
        write_metrics(&output, "renderir", &stats, started)?;
    }
    Ok(output)
}

/// Report render cost and per-channel response of a rendered file as
/// `<output>.metrics.json`.
fn write_metrics(output: &Path, name: &str, stats: &RenderStats, started: Instant) -> Result<()> {
    let file = read_wav(output)
        .with_context(|| format!("failed to read back {}", output.display()))?;
    let mut builder = MetricsReportBuilder::new(name)
        .result(TestResult::Pass)
        .rendering(RenderMetrics {
            sample_rate: f64::from(file.sample_rate),
            frames: stats.frames,
            active_pointsources: stats.active_pointsources,
            total_pointsources: stats.total_pointsources,
            prepare_ms: stats.prepare_time.as_secs_f64() * 1e3,
            process_ms: stats.process_time.as_secs_f64() * 1e3,
        });
    for (k, ch) in file.channels.iter().enumerate() {
        builder = builder.response(format!("out.{k}"), ch);
    }
    let report = builder
        .execution(TestExecutionMetrics {
            duration_seconds: started.elapsed().as_secs_f64(),
            assertions_checked: None,
        })
        .build();
    let mut path = output.as_os_str().to_owned();
    path.push(".metrics.json");
    let path = PathBuf::from(path);
    MetricsSink::create(&path)?
        .write(&report)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote render metrics");
    Ok(())
}

/// One line per sound: scene, input port name, port index and the
/// position at the first key frame, ignoring source orientation.
pub fn list_sources(session: &Path) -> Result<String> {
    let session = Session::load_file(session)
        .with_context(|| format!("failed to load {}", session.display()))?;
    let mut out = String::new();
    for scene in &session.scene {
        let ports = scene.input_ports();
        let mut port = 0;
        for src in &scene.source {
            let origin = src
                .object
                .position
                .first()
                .filter(|key| key.len() >= 4)
                .map(|key| [key[1], key[2], key[3]])
                .unwrap_or_default();
            for snd in src.sounds() {
                let local = snd.local_position();
                let p = [origin[0] + local.x, origin[1] + local.y, origin[2] + local.z];
                let label = ports.get(port).map(String::as_str).unwrap_or("?");
                writeln!(
                    out,
                    "{}\t{}\t{}\t{:.3} {:.3} {:.3}",
                    scene.name, label, port, p[0], p[1], p[2]
                )?;
                port += 1;
            }
        }
    }
    Ok(out)
}

/// Load and validate a session; returns a short summary.
pub fn validate(session: &Path) -> Result<String> {
    let session = Session::load_file(session)
        .with_context(|| format!("invalid session {}", session.display()))?;
    let mut out = String::new();
    for scene in &session.scene {
        writeln!(
            out,
            "{}: {} sources, {} receivers, {} faces, {} inputs, {} outputs",
            scene.name,
            scene.source.len(),
            scene.receiver.len(),
            scene.face.len(),
            scene.input_ports().len(),
            scene.output_ports().len()
        )?;
    }
    Ok(out)
}

/// Write the skeleton session, or return it when no path is given.
pub fn skeleton(output: Option<&Path>) -> Result<Option<String>> {
    match output {
        Some(path) => {
            if path.exists() {
                bail!("{} already exists", path.display());
            }
            fs::write(path, SKELETON)
                .with_context(|| format!("failed to write {}", path.display()))?;
            Ok(None)
        }
        None => Ok(Some(SKELETON.to_string())),
    }
}

pub fn about() -> String {
    format!("tascar {}\n{}", env!("CARGO_PKG_VERSION"), TASCAR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skeleton_is_a_valid_session() {
        let session = Session::parse_str(SKELETON).expect("valid skeleton");
        let scene = session.scene("").expect("scene");
        assert_eq!(scene.input_ports(), vec!["src.0".to_string()]);
        assert_eq!(scene.output_ports().len(), 5);
    }

    #[test]
    fn skeleton_refuses_to_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("s.toml");
        assert_eq!(skeleton(Some(&path)).expect("written"), None);
        assert!(skeleton(Some(&path)).is_err());
        assert!(skeleton(None).expect("text").is_some());
    }

    #[test]
    fn validate_and_list_skeleton() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("s.toml");
        fs::write(&path, SKELETON).expect("writable");
        let summary = validate(&path).expect("valid");
        assert!(summary.starts_with("main: 1 sources, 2 receivers, 1 faces"));
        let list = list_sources(&path).expect("listed");
        assert_eq!(list.lines().count(), 1);
        assert_eq!(list, "main\tsrc.0\t0\t2.000 1.000 0.000\n");
    }

    #[test]
    fn metrics_are_written_next_to_the_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = dir.path().join("s.toml");
        fs::write(&session, SKELETON).expect("writable");
        let cfg = RenderConfig {
            output_dir: Some(dir.path().to_path_buf()),
            write_metrics: true,
            ..RenderConfig::default()
        };
        let opts = RenderOptions {
            ism_range: Some((0, 0)),
            channels: vec![0],
            ..RenderOptions::default()
        };
        let out = render_ir(&cfg, &session, Path::new("ir.wav"), 512, 44100.0, 0, &opts)
            .expect("render");
        assert_eq!(out, dir.path().join("ir.wav"));
        let metrics = fs::read_to_string(dir.path().join("ir.wav.metrics.json"))
            .expect("metrics written");
        assert!(metrics.contains("\"test_name\": \"renderir\""));
        assert!(metrics.contains("\"port\": \"out.0\""));
    }

    #[test]
    fn empty_ism_range_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = dir.path().join("s.toml");
        fs::write(&session, SKELETON).expect("writable");
        let opts = RenderOptions {
            ism_range: Some((2, 1)),
            ..RenderOptions::default()
        };
        let err = render_ir(
            &RenderConfig::default(),
            &session,
            &dir.path().join("ir.wav"),
            64,
            44100.0,
            0,
            &opts,
        );
        assert!(err.is_err());
    }
}
