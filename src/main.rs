//! tascar - offline acoustic scene renderer
//!
//! Renders TOML session files to sound files and impulse responses.

mod about;
mod commands;
mod config;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::RenderOptions;
use config::RenderConfig;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log render progress and timing.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// User defaults (fragment size, output directory, metrics).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// Session file.
    session: PathBuf,

    /// Scene name; the first scene when omitted.
    #[arg(short, long, default_value = "")]
    scene: String,

    /// Session time in seconds at which rendering starts.
    #[arg(short = 't', long, default_value_t = 0.0)]
    starttime: f64,

    /// Lowest image source order to render.
    #[arg(long, requires = "ismmax")]
    ismmin: Option<u32>,

    /// Highest image source order to render.
    #[arg(long, requires = "ismmin")]
    ismmax: Option<u32>,

    /// Output channels to write, in order (comma separated).
    #[arg(short, long, value_delimiter = ',')]
    channels: Vec<usize>,
}

impl SceneArgs {
    fn options(&self) -> RenderOptions {
        RenderOptions {
            scene: self.scene.clone(),
            starttime: self.starttime,
            channels: self.channels.clone(),
            ism_range: self.ismmin.zip(self.ismmax),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a sound file through a scene.
    Renderfile {
        #[command(flatten)]
        scene: SceneArgs,

        /// Output sound file.
        #[arg(short, long)]
        output: PathBuf,

        /// Input sound file; silent inputs for --duration when omitted.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Fragment size in samples.
        #[arg(short, long)]
        fragsize: Option<usize>,

        /// Duration in seconds without an input file (0 uses the session duration).
        #[arg(short, long, default_value_t = 0.0)]
        duration: f64,

        /// Sample rate without an input file.
        #[arg(long)]
        fs: Option<f64>,

        /// Keep the geometry frozen at the start time.
        #[arg(long = "static")]
        frozen: bool,
    },
    /// Render the impulse response of one input port.
    Renderir {
        #[command(flatten)]
        scene: SceneArgs,

        /// Output sound file.
        #[arg(short, long)]
        output: PathBuf,

        /// Length in samples.
        #[arg(short, long, default_value_t = 44100)]
        len: usize,

        /// Sample rate.
        #[arg(long, default_value_t = 44100.0)]
        fs: f64,

        /// Input port receiving the impulse.
        #[arg(short, long, default_value_t = 0)]
        inputchannel: usize,
    },
    /// List the sounds of a session with their input ports.
    Listsrc {
        /// Session file.
        session: PathBuf,
    },
    /// Check a session file and summarize its scenes.
    Validate {
        /// Session file.
        session: PathBuf,
    },
    /// Write a minimal session file, or print it.
    Skeleton {
        /// Target file; printed to stdout when omitted.
        output: Option<PathBuf>,
    },
    /// Show the upstream project descriptor.
    About,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // WARN by default (INFO with --verbose); RUST_LOG takes precedence
    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let cfg = match &cli.config {
        Some(path) => RenderConfig::load_from_path(path),
        None => RenderConfig::load(),
    };
    info!("Starting tascar v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Renderfile {
            scene,
            output,
            input,
            fragsize,
            duration,
            fs,
            frozen,
        } => {
            commands::render_file(
                &cfg,
                &scene.session,
                input.as_deref(),
                &output,
                fragsize,
                duration,
                fs,
                !frozen,
                &scene.options(),
            )?;
        }
        Command::Renderir {
            scene,
            output,
            len,
            fs,
            inputchannel,
        } => {
            commands::render_ir(
                &cfg,
                &scene.session,
                &output,
                len,
                fs,
                inputchannel,
                &scene.options(),
            )?;
        }
        Command::Listsrc { session } => print!("{}", commands::list_sources(&session)?),
        Command::Validate { session } => print!("{}", commands::validate(&session)?),
        Command::Skeleton { output } => {
            if let Some(text) = commands::skeleton(output.as_deref())? {
                print!("{text}");
            }
        }
        Command::About => println!("{}", commands::about()),
    }
    Ok(())
}
