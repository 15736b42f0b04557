use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use voice_cart::voice::{
    AudioSource, FeedRecognizer, InputLevel, MicrophoneCapture, Recognizer, RecognizerFeed,
    SAMPLE_RATE, SilentSource, TranscriptEvent, tokenize,
};
use voice_cart::{Config, LogPresenter, SessionController, SessionHandle, TranscriptClassifier};

/// voicecart - build a product list by voice
#[derive(Parser)]
#[command(name = "voicecart", version, about)]
struct Cli {
    /// Product vocabulary file (`{"products": [...]}`)
    #[arg(short, long)]
    products: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Don't open the microphone
    #[arg(long, env = "VOICE_CART_DISABLE_MIC")]
    no_mic: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive session; typed lines stand in for recognized speech
    Listen,
    /// Classify a single utterance
    Classify {
        /// Utterance text
        text: String,
    },
    /// List recognizable products
    Products,
    /// Show microphone input levels
    TestMic {
        /// Seconds to listen
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,voice_cart=info",
        1 => "info,voice_cart=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_with_options(cli.products, cli.no_mic)?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Listen) {
        Command::Listen => listen(&config).await,
        Command::Classify { text } => {
            classify(&config, &text);
            Ok(())
        }
        Command::Products => {
            let vocabulary = config.vocabulary();
            for product in vocabulary.sorted_products() {
                println!("{product}");
            }
            Ok(())
        }
        Command::TestMic { duration } => test_mic(duration).await,
    }
}

/// Run an interactive session until `/quit`, EOF or Ctrl-C
#[allow(clippy::future_not_send)]
async fn listen(config: &Config) -> anyhow::Result<()> {
    let classifier = TranscriptClassifier::new(Arc::new(config.vocabulary()));
    let recognizer = FeedRecognizer::new().with_locale(config.locale.clone());
    let feed = recognizer.feed();
    let audio = open_audio(config, &recognizer);

    let (controller, handle) = SessionController::new(
        classifier,
        Box::new(recognizer),
        audio,
        Box::new(LogPresenter),
        config.session(),
    );

    // Refresh the displayed list whenever it changes
    let mut products = handle.subscribe();
    tokio::spawn(async move {
        while products.changed().await.is_ok() {
            let current = products.borrow_and_update().clone();
            println!("products: [{}]", current.join(", "));
        }
    });

    let ctrl_c = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = ctrl_c.shutdown().await;
        }
    });

    tokio::spawn(read_commands(handle, feed, spawn_stdin_reader()));

    println!("type /record to start or stop, /final, /error <msg>, /list, /quit");
    let products = controller.run().await;
    println!("final list: [{}]", products.join(", "));
    Ok(())
}

/// Open the microphone only if the recognizer consumes audio
fn open_audio(config: &Config, recognizer: &dyn Recognizer) -> Box<dyn AudioSource> {
    if !config.capture_audio(recognizer) {
        if config.microphone {
            tracing::info!(
                recognizer = recognizer.name(),
                "recognizer takes no audio, leaving microphone closed"
            );
        }
        return Box::new(SilentSource::default());
    }

    match MicrophoneCapture::new() {
        Ok(mic) => Box::new(mic),
        Err(e) => {
            tracing::warn!(error = %e, "microphone unavailable, continuing without audio");
            Box::new(SilentSource::default())
        }
    }
}

/// Read stdin on a dedicated OS thread so a pending read never blocks exit
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!(error = %e, "failed to read stdin");
                    break;
                }
            };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Turn stdin lines into record presses and transcript events
async fn read_commands(
    handle: SessionHandle,
    feed: RecognizerFeed,
    mut lines: mpsc::Receiver<String>,
) {
    let mut transcript: Vec<String> = Vec::new();

    while let Some(line) = lines.recv().await {
        let line = line.trim();

        let sent = match line {
            "" => continue,
            "/quit" => break,
            "/list" => {
                println!(
                    "products: [{}]",
                    handle.current_added_products().join(", ")
                );
                continue;
            }
            "/record" => {
                transcript.clear();
                if handle.press_record().await.is_err() {
                    break;
                }
                continue;
            }
            "/final" => {
                feed.send(TranscriptEvent::final_result(std::mem::take(&mut transcript)))
                    .await
            }
            _ if line.starts_with("/error") => {
                let message = line.trim_start_matches("/error").trim();
                feed.send(TranscriptEvent::failure(if message.is_empty() {
                    "recognition failed"
                } else {
                    message
                }))
                .await
            }
            _ => {
                transcript.extend(tokenize(line));
                feed.send(TranscriptEvent::partial(transcript.clone())).await
            }
        };

        if !sent {
            transcript.clear();
            println!("not recording - type /record first");
        }
    }

    let _ = handle.shutdown().await;
}

/// Print the classification of one utterance
fn classify(config: &Config, text: &str) {
    let classifier = TranscriptClassifier::new(Arc::new(config.vocabulary()));
    let result = classifier.classify(tokenize(text), true);

    println!("add:    [{}]", result.lists.additions.join(", "));
    println!("delete: [{}]", result.lists.deletions.join(", "));
    println!("stop:   {}", result.stop_requested);
}

/// Peak level treated as someone speaking
const SPEECH_PEAK: f32 = 0.05;

/// Width of the level bar
const BAR_WIDTH: usize = 40;

/// Print one input level line per second so the microphone can be checked
/// before a session
#[allow(clippy::future_not_send)]
async fn test_mic(seconds: u64) -> anyhow::Result<()> {
    let level = Arc::new(Mutex::new(InputLevel::default()));
    let sink_level = Arc::clone(&level);

    let mut capture = MicrophoneCapture::new()?;
    capture.start(Arc::new(move |data: &[f32]| {
        sink_level
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(data);
    }))?;

    println!(
        "listening on the default input ({SAMPLE_RATE} Hz) for {seconds}s, say a product name"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.tick().await;

    let mut heard = false;
    for second in 1..=seconds {
        ticker.tick().await;
        let current =
            std::mem::take(&mut *level.lock().unwrap_or_else(PoisonError::into_inner));
        heard |= current.peak >= SPEECH_PEAK;

        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let filled = ((current.rms() * 4.0).min(1.0) * BAR_WIDTH as f32) as usize;
        println!(
            "{second:>3}s  rms {:.3}  peak {:.3}  |{}{}|",
            current.rms(),
            current.peak,
            "=".repeat(filled),
            " ".repeat(BAR_WIDTH - filled)
        );
    }

    capture.stop();

    if heard {
        println!("input detected");
    } else {
        println!(
            "no input above {SPEECH_PEAK}; check the default input device or run with --no-mic"
        );
    }
    Ok(())
}
