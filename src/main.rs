use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use coach_relay::api::ApiServerBuilder;
use coach_relay::voice::SpeechSynthesizer;
use coach_relay::{CoachRelay, Config, SpeakRequest, TextToSpeech};

/// Coach - speaking-practice relay for a browser voice client
#[derive(Parser)]
#[command(name = "coach", version, about)]
struct Cli {
    /// Port to listen on (overrides `COACH_PORT` and the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Directory containing the built web client
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP relay (default)
    Serve,
    /// Run one coaching turn and print the reply
    Ask {
        /// What the learner said
        text: String,
    },
    /// Synthesize text with the configured TTS provider
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
        /// Write the MP3 here
        #[arg(short, long, default_value = "coach-tts-test.mp3")]
        out: PathBuf,
    },
    /// Print the resolved configuration (keys redacted)
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,coach_relay=info",
        1 => "info,coach_relay=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.static_dir.is_some() {
        config.server.static_dir = cli.static_dir;
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Ask { text } => ask(&config, text).await,
        Command::TestTts { text, out } => test_tts(&config, &text, &out).await,
        Command::Config => {
            println!("{config:#?}");
            Ok(())
        }
    }
}

/// Run the relay until interrupted
async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        port = config.server.port,
        static_dir = ?config.server.static_dir,
        "starting coaching relay"
    );

    let relay = CoachRelay::from_config(&config)?;
    let server = ApiServerBuilder::new(relay, config.server.port)
        .static_dir(config.server.static_dir)
        .rate_limit_per_minute(config.server.rate_limit_per_minute)
        .build();

    tracing::info!("open http://localhost:{} to start practicing", config.server.port);
    server.run().await?;

    Ok(())
}

/// One turn without the browser
async fn ask(config: &Config, text: String) -> anyhow::Result<()> {
    let relay = CoachRelay::from_config(config)?;
    let response = relay
        .speak(&SpeakRequest {
            text,
            history: Vec::new(),
        })
        .await?;

    println!("{}", response.reply);
    match response.audio_base64 {
        Some(audio) => println!("\n(audio: {} base64 chars)", audio.len()),
        None => println!("\n(no audio)"),
    }

    Ok(())
}

/// Synthesize a sample and write it to disk
async fn test_tts(config: &Config, text: &str, out: &std::path::Path) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let tts = TextToSpeech::from_config(config)?.ok_or_else(|| {
        anyhow::anyhow!(
            "no API key for TTS provider {}",
            config.voice.provider.as_str()
        )
    })?;

    println!("Synthesizing speech with {}...", tts.name());
    let mp3_data = tts.synthesize(text).await?;
    println!("Got {} bytes of audio data", mp3_data.len());

    // Check MP3 header
    if let Some(header) = header_hex(&mp3_data) {
        println!("First 4 bytes: {header}");
    }

    tokio::fs::write(out, &mp3_data).await?;
    println!("Wrote {}", out.display());

    Ok(())
}

/// First four bytes as hex, if there are that many
fn header_hex(data: &[u8]) -> Option<String> {
    let [a, b, c, d, ..] = data[..] else {
        return None;
    };
    Some(format!("{a:02x} {b:02x} {c:02x} {d:02x}"))
}
