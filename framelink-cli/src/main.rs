use anyhow::Result;
use clap::{Parser, Subcommand};
use framelink_cli::{commands, load_config, CodecKind};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "framelink")]
#[command(about = "Framelink - Framed message exchange over serial links", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON file with link settings
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a captured byte stream through a codec
    Replay {
        /// Captured bytes to replay
        #[arg(short, long)]
        input: String,

        /// Framing used by the capture
        #[arg(long, value_enum, default_value = "line")]
        codec: CodecKind,

        /// Length-prefixed packets carry a CRC32C trailer
        #[arg(long)]
        crc: bool,

        /// Bytes per simulated delivery
        #[arg(long, default_value = "64")]
        chunk: usize,

        /// Output JSON file for the replay report
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Send a line command to a serial device and print the response
    Query {
        /// Serial port, e.g. /dev/ttyACM0 or COM3
        #[arg(short, long)]
        device: String,

        /// Baud rate (overrides the config file)
        #[arg(long)]
        baud: Option<u32>,

        /// Command line to send
        #[arg(short, long)]
        command: String,

        /// Line that ends the response
        #[arg(long, default_value = "OK")]
        terminator: String,

        /// Give up after this many milliseconds without a response line
        #[arg(long, default_value = "1000")]
        idle_timeout: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut config = load_config(cli.config.as_deref())?;

    // Execute command
    match cli.command {
        Commands::Replay {
            input,
            codec,
            crc,
            chunk,
            output,
        } => commands::replay::execute(&input, codec, crc, chunk, output.as_deref()),

        Commands::Query {
            device,
            baud,
            command,
            terminator,
            idle_timeout,
        } => {
            if let Some(baud) = baud {
                config.baud_rate = baud;
            }
            commands::query::execute(&device, &command, &terminator, idle_timeout, &config)
        }
    }
}
