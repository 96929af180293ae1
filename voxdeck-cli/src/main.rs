use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "voxdeck")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "VoxDeck - turn text segments into speech tracks")]
struct Args {
    /// Settings file to use instead of ~/.voxdeck/settings.toml
    #[arg(long, global = true, value_name = "PATH")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Wrap a raw PCM file in a WAV container
    Frame {
        input: PathBuf,
        output: PathBuf,
        /// Defaults to the configured sample rate
        #[arg(long)]
        sample_rate: Option<u32>,
    },

    /// Join raw PCM files in order into one WAV file
    Concat {
        output: PathBuf,
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long)]
        sample_rate: Option<u32>,
    },

    /// Print a file as base64
    Encode { input: PathBuf },

    /// Decode a base64 text file back to bytes
    Decode { input: PathBuf, output: PathBuf },

    /// Generate speech for every line of a script and write WAV files
    Render {
        script: PathBuf,
        /// Defaults to export.output_dir, then the current directory
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Play the rendered segments on the default output device
        #[cfg(feature = "device")]
        #[arg(long)]
        play: bool,
    },

    /// List the voices offered by the configured speech engine
    Voices,
}

fn main() -> Result<()> {
    let _guard = setup_tracing()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    let args = Args::parse();
    info!("CLI startup: {:?}", args.command);

    let settings = commands::load_settings(args.settings)?;

    match args.command {
        Command::Frame {
            input,
            output,
            sample_rate,
        } => {
            commands::frame(
                &input,
                &output,
                sample_rate.unwrap_or(settings.sample_rate),
            )
            .await
        }
        Command::Concat {
            output,
            inputs,
            sample_rate,
        } => {
            commands::concat(
                &inputs,
                &output,
                sample_rate.unwrap_or(settings.sample_rate),
            )
            .await
        }
        Command::Encode { input } => commands::encode(&input).await,
        Command::Decode { input, output } => commands::decode(&input, &output).await,
        #[cfg(feature = "device")]
        Command::Render {
            script,
            out_dir,
            play,
        } => commands::render(&settings, &script, out_dir, play).await,
        #[cfg(not(feature = "device"))]
        Command::Render { script, out_dir } => {
            commands::render(&settings, &script, out_dir, false).await
        }
        Command::Voices => commands::voices(&settings).await,
    }
}

/// Log to ~/.voxdeck/trace/voxdeck.log. `RUST_LOG` overrides the default
/// `info` filter.
fn setup_tracing() -> Result<WorkerGuard> {
    use tracing_subscriber::fmt;

    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
    let trace_dir = home.join(".voxdeck").join("trace");
    std::fs::create_dir_all(&trace_dir)?;

    let appender = tracing_appender::rolling::never(&trace_dir, "voxdeck.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .init();

    info!("Tracing initialized to {:?}", trace_dir.join("voxdeck.log"));
    Ok(guard)
}
