use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use transcript_proxy::{
    database::TranscriptDatabase,
    extract_video_id, fetch_with_failover,
    proxy::{build_proxy_config, AttemptStatus, FailoverEvent, ProxyParser, ProxyRecord},
    Config, ProxyError, ProxyStrategy, TranscriptFetcher, TranscriptOrchestrator, TranscriptResult,
    YouTubeTranscriptFetcher,
};

/// Video used by the proxy diagnostics when none is given
const TEST_VIDEO_ID: &str = "dQw4w9WgXcQ";

const RULE_WIDTH: usize = 80;

/// Fetch YouTube transcripts through rotating proxies
#[derive(Parser)]
#[command(name = "transcript-proxy")]
#[command(about = "Fetch YouTube transcripts through rotating proxies")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Proxy list file (IP:PORT:USERNAME:PASSWORD per line)
    #[arg(short, long, global = true, default_value = "proxies.txt")]
    proxy_file: PathBuf,

    /// Database file path
    #[arg(short, long, global = true, default_value = "transcripts.db")]
    database: String,

    /// Preferred transcript languages, most wanted first
    #[arg(short, long, global = true, value_delimiter = ',', default_value = "en")]
    languages: Vec<String>,

    /// Timeout in seconds for each HTTP request
    #[arg(long, global = true, default_value = "30")]
    timeout: u64,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a transcript and store it in the database
    Fetch {
        /// YouTube URL or video ID
        url_or_id: String,
        #[command(flatten)]
        route: RouteArgs,
        /// Ignore stored transcripts and fetch again
        #[arg(long)]
        refresh: bool,
    },
    /// Try every proxy until one can fetch a transcript
    FindProxy {
        /// YouTube URL or video ID to test with
        #[arg(default_value = TEST_VIDEO_ID)]
        url_or_id: String,
    },
    /// Load the proxy file, build one proxy config and test it
    CheckProxy {
        /// YouTube URL or video ID to test with
        #[arg(default_value = TEST_VIDEO_ID)]
        url_or_id: String,
        /// Zero-based index of the proxy to test
        #[arg(short, long, default_value = "0")]
        index: usize,
    },
}

#[derive(Args)]
#[group(multiple = false)]
struct RouteArgs {
    /// Zero-based index of the proxy to use [default: 0]
    #[arg(long)]
    proxy_index: Option<usize>,
    /// Try every proxy in order until one works
    #[arg(long)]
    failover: bool,
    /// Connect without a proxy
    #[arg(long)]
    direct: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config {
        database_url: cli.database,
        proxy_file: cli.proxy_file,
        languages: cli.languages,
        timeout: Duration::from_secs(cli.timeout),
    };

    let outcome = match cli.command {
        Commands::Fetch {
            url_or_id,
            route,
            refresh,
        } => run_fetch(&config, &url_or_id, &route, refresh).await,
        Commands::FindProxy { url_or_id } => run_find_proxy(&config, &url_or_id).await,
        Commands::CheckProxy { url_or_id, index } => {
            run_check_proxy(&config, &url_or_id, index).await
        }
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("✗ Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "transcript_proxy=debug,info"
    } else {
        "transcript_proxy=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Fetch one transcript through the orchestrator and print it
async fn run_fetch(config: &Config, url_or_id: &str, route: &RouteArgs, refresh: bool) -> Result<bool> {
    let Some(video_id) = parse_video_id(url_or_id) else {
        return Ok(false);
    };
    println!("Fetching transcript for: {}", video_id);

    let strategy = if route.direct {
        ProxyStrategy::Direct
    } else {
        let Some(proxies) = load_proxies(config)? else {
            return Ok(false);
        };
        if route.failover {
            ProxyStrategy::Failover(proxies)
        } else {
            ProxyStrategy::Single(build_proxy_config(&proxies, route.proxy_index.unwrap_or(0))?)
        }
    };

    let db = TranscriptDatabase::new(&config.database_url).await?;
    let fetcher = YouTubeTranscriptFetcher::with_config(config.fetcher_config());
    let orchestrator = TranscriptOrchestrator::new(&db, fetcher, strategy)
        .with_languages(config.languages.clone())
        .with_refresh(refresh);

    let result = orchestrator.get_transcript(&video_id).await;
    db.close().await;

    match result? {
        Some(transcript) => {
            println!("\n✓ SUCCESS!");
            print_details(&transcript, "  ");
            println!("\nTranscript:");
            println!("{}", "-".repeat(RULE_WIDTH));
            println!("{}", transcript.transcript);
            println!("{}", "-".repeat(RULE_WIDTH));
            Ok(true)
        }
        None => {
            println!("\n✗ No transcript available for video: {}", video_id);
            println!("  This video might not have captions/subtitles enabled");
            Ok(false)
        }
    }
}

/// Test every proxy in order and report the first one that works
async fn run_find_proxy(config: &Config, url_or_id: &str) -> Result<bool> {
    let Some(video_id) = parse_video_id(url_or_id) else {
        return Ok(false);
    };
    let Some(proxies) = load_proxies(config)? else {
        return Ok(false);
    };

    println!("Testing {} proxies...", proxies.len());
    println!("{}", "=".repeat(RULE_WIDTH));

    let fetcher = YouTubeTranscriptFetcher::with_config(config.fetcher_config());
    let report = fetch_with_failover(&fetcher, &video_id, &config.languages, &proxies, |event| {
        match event {
            FailoverEvent::Started {
                index,
                total,
                proxy,
            } => println!("\n[{}/{}] Testing proxy: {}", index + 1, total, proxy),
            FailoverEvent::Finished(attempt) => match &attempt.status {
                AttemptStatus::Success => {}
                AttemptStatus::NoTranscript => println!("  ✗ No transcript returned"),
                AttemptStatus::Failed { kind, message } => {
                    println!("  ✗ Error: {}: {}", kind, message)
                }
            },
        }
    })
    .await;

    let found = match report.result {
        Some((index, transcript)) => {
            println!("  ✓✓✓ SUCCESS! ✓✓✓");
            print_details(&transcript, "  ");
            println!("  Preview: {}...", transcript.preview(100));
            println!("\n  ✓ Proxy #{} works! Use this one.", index);
            true
        }
        None => {
            println!("\n✗ None of the proxies worked. This could mean:");
            println!("  - All proxies are blocked by YouTube");
            println!("  - The proxies don't support HTTPS tunneling");
            println!("  - You need residential proxies (not datacenter proxies)");
            false
        }
    };

    println!("\n{}", "=".repeat(RULE_WIDTH));
    Ok(found)
}

/// Step through loading, configuring and using a single proxy
async fn run_check_proxy(config: &Config, url_or_id: &str, index: usize) -> Result<bool> {
    let Some(video_id) = parse_video_id(url_or_id) else {
        return Ok(false);
    };

    print_heading("TEST 1: Loading Proxies from File");
    let Some(proxies) = load_proxies(config)? else {
        return Ok(false);
    };
    println!(
        "✓ Loaded {} proxies from {}",
        proxies.len(),
        config.proxy_file.display()
    );
    if let Some(first) = proxies.first() {
        println!("  First proxy: {}", first);
    }

    println!();
    print_heading("TEST 2: Setting up Proxy Configuration");
    let proxy_config = match build_proxy_config(&proxies, index) {
        Ok(proxy_config) => proxy_config,
        Err(e) => {
            println!("✗ Failed to create proxy configuration: {}", e);
            return Ok(false);
        }
    };
    println!("✓ Proxy configuration created successfully");
    println!("  HTTP URL: {}", proxy_config.http_url);
    println!("  HTTPS URL: {}", proxy_config.https_url);

    println!();
    print_heading("TEST 3: Fetching YouTube Transcript with Proxy");
    println!("Fetching transcript for video: {}", video_id);
    println!("This may take 10-30 seconds...");

    let fetcher = YouTubeTranscriptFetcher::with_config(config.fetcher_config());
    let ok = match fetcher
        .fetch_transcript(&video_id, &config.languages, Some(&proxy_config))
        .await
    {
        Ok(Some(transcript)) => {
            println!("\n✓✓✓ SUCCESS! ✓✓✓");
            print_details(&transcript, "  ");
            println!("  Transcript preview: {}...", transcript.preview(150));
            println!("\n✓ Proxy is working! Your application can now fetch transcripts!");
            true
        }
        Ok(None) => {
            println!("\n✗ Failed: No transcript returned");
            println!("  This could mean:");
            println!("  - The proxy doesn't work");
            println!("  - The video has no transcript");
            println!("  - YouTube is still blocking requests");
            false
        }
        Err(e) => {
            println!("\n✗ Error: {}: {}", e.kind(), e);
            false
        }
    };

    println!("\n{}", "=".repeat(RULE_WIDTH));
    Ok(ok)
}

fn parse_video_id(url_or_id: &str) -> Option<String> {
    let video_id = extract_video_id(url_or_id);
    if video_id.is_none() {
        println!("✗ Invalid YouTube URL or video ID: {}", url_or_id);
    }
    video_id
}

/// Load the proxy file; `None` when it is missing, after explaining the format
fn load_proxies(config: &Config) -> Result<Option<Vec<ProxyRecord>>> {
    match ProxyParser::load_file(&config.proxy_file) {
        Ok(proxies) => Ok(Some(proxies)),
        Err(ProxyError::FileNotFound(path)) => {
            println!("{}", missing_proxy_file_help(&path));
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn missing_proxy_file_help(path: &Path) -> String {
    format!(
        "✗ ERROR: Proxy file not found: {}\n  \
         Please create it with one proxy per line:\n  \
         IP:PORT:USERNAME:PASSWORD\n  \
         Example: 142.111.48.253:7030:username:password",
        path.display()
    )
}

fn print_heading(title: &str) {
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("{}", title);
    println!("{}", "=".repeat(RULE_WIDTH));
}

fn print_details(transcript: &TranscriptResult, indent: &str) {
    println!("{}Video ID: {}", indent, transcript.video_id);
    println!("{}Language: {}", indent, transcript.language);
    println!("{}Type: {}", indent, transcript.transcript_type);
    println!("{}Duration: {}s", indent, transcript.duration);
}
