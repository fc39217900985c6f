//! heritage-search: interactive command-line front end
//!
//! Reads one command per line from stdin and prints results as text.

use anyhow::Result;
use heritage_search::{
    capture::{FileAudioDevice, ImageCapture, VoicePayload, VoiceRecorder},
    config::{self, Settings},
    network::HttpClient,
    notify::{Notice, Notifier},
    orchestrator::{SearchOrchestrator, View},
    search::{SearchClient, SearchQuery, SearchResponse},
    CaptureError,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let settings_path = config::locate();
    let settings = config::load(settings_path.as_deref())?;

    init_logging(settings.general.debug);
    info!("Starting heritage-search v{}", heritage_search::VERSION);
    match settings_path {
        Some(path) => info!("Loaded settings from: {}", path.display()),
        None => info!("No settings file found, using defaults"),
    }

    let http = HttpClient::with_settings(&settings.outgoing)?;
    let client = SearchClient::new(http, &settings.api)?;
    info!("Search API at {}", settings.api.base_url);

    let orchestrator = SearchOrchestrator::new(Arc::new(client), Arc::new(ConsoleNotifier))
        .with_image_capture(ImageCapture::new(settings.capture.max_image_bytes));

    println!("{}", settings.general.instance_name);
    println!("Discover the rich cultural heritage, traditions, and art of Assam");
    if let View::Gallery { .. } = orchestrator.view() {
        print!("{}", gallery());
    }
    print_usage();

    // Loading indicator, printed when a search starts
    let mut updates = orchestrator.subscribe();
    tokio::spawn(async move {
        let mut was_searching = false;
        while updates.changed().await.is_ok() {
            let searching = updates.borrow_and_update().is_searching;
            if searching && !was_searching {
                println!("Searching...");
            }
            was_searching = searching;
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let outcome = match Command::parse(&line) {
            Command::Quit => break,
            Command::Help => {
                print_usage();
                continue;
            }
            Command::Text(query) => orchestrator.search_text(query).await,
            Command::Image(path) => orchestrator.search_image_path(path).await,
            Command::Voice(path) => {
                let recording = record_file(path, &settings).await;
                orchestrator.submit(recording.map(SearchQuery::Voice)).await
            }
        };

        // Capture errors were already shown by the notifier
        if outcome.is_ok() {
            match orchestrator.view() {
                View::Results {
                    response: Some(response),
                    ..
                } => print_response(&response),
                View::Results { response: None, .. } => {}
                View::Gallery { .. } => print!("{}", gallery()),
            }
        }
    }

    info!("Goodbye");
    Ok(())
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Record from an audio file as if it were the microphone
async fn record_file(path: &str, settings: &Settings) -> Result<VoicePayload, CaptureError> {
    let recorder =
        VoiceRecorder::new(Arc::new(FileAudioDevice::new(path))).with_settings(&settings.capture);
    let payload = recorder.start().await?.finish().await?;
    debug!(
        "Recorded {} bytes in {:?} ({:?})",
        payload.bytes.len(),
        payload.duration,
        payload.stop_reason
    );
    Ok(payload)
}

/// Prints notices to the terminal
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        println!("{}", notice);
    }
}

/// One line of user input
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Text(&'a str),
    Image(&'a str),
    Voice(&'a str),
    Help,
    Quit,
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix(':') else {
            return Self::Text(line);
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name {
            "image" | "img" => Self::Image(arg),
            "voice" | "mic" => Self::Voice(arg),
            "quit" | "q" | "exit" => Self::Quit,
            _ => Self::Help,
        }
    }
}

fn print_usage() {
    println!(
        r#"
Type a query and press enter to search. Other commands:
    :image <FILE>    Search with an image (max 5MB by default)
    :voice <FILE>    Search with a recorded audio clip
    :help            Show this help
    :quit            Exit
"#
    );
}

/// Topics shown before the first search
const GALLERY: [(&str, &str); 4] = [
    ("Bihu Dance", "Bihu dancers performing traditional Assamese dance"),
    ("Tea Garden", "Tea garden workers in Assam"),
    ("Sattriya Dance", "Monks performing Sattriya dance"),
    ("Tribal Dance", "Tribal dance performance"),
];

fn gallery() -> String {
    let mut out = String::from("\nExplore Assamese Culture\n");
    for (title, caption) in GALLERY {
        out.push_str(&format!("    {:<16}{}\n", title, caption));
    }
    out
}

fn print_response(response: &SearchResponse) {
    let time = response
        .search_time
        .map(|t| format!("{:.2} seconds", t))
        .unwrap_or_else(|| "Search".to_string());

    println!();
    println!(
        "{} results ({} for \"{}\") - {}",
        response.total_results,
        time,
        response.query,
        response.search_type.label()
    );
    if response.is_fallback() {
        println!("(sample results: the search service did not answer)");
    }

    for (index, result) in response.results.iter().enumerate() {
        println!();
        println!("{}. {}", index + 1, result.title);
        if let Some(ref url) = result.source_url {
            println!("   {}", url);
        }
        if let Some(ref url) = result.image_url {
            println!("   image: {}", url);
        }
        println!("   {}", result.description);

        let mut footer: Vec<String> = Vec::new();
        footer.extend(result.date.clone());
        footer.extend(result.category.clone());
        if let Some(ref tags) = result.tags {
            footer.extend(tags.iter().map(|t| format!("#{}", t)));
        }
        if !footer.is_empty() {
            println!("   {}", footer.join("  "));
        }
    }
    println!();
}
