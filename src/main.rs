use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use eyre::{Result, bail};
use log::{debug, info, warn};
use vidsum::orchestrator::{Orchestrator, Phase};
use vidsum::summarize::DetailLevel;

mod cli;

use cli::{Cli, OutputFormat};

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("vidsum.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vidsum")
        .join("logs")
}

fn build_after_help() -> String {
    let log_path = log_dir().join("vidsum.log");
    let config_path = vidsum::config::config_path();

    format!(
        "\nCREDENTIALS (optional):\n  YOUTUBE_API_KEY   enables transcript context\n  GEMINI_API_KEY    enables AI summaries (templated fallback otherwise)\n\nSESSION COMMANDS:\n  :history  :fav N  :rm N  :clear  :level L  :quit\n\nConfig file: {}\nLogs are written to: {}",
        config_path.display(),
        log_path.display()
    )
}

/// Print progress labels to stderr while a request runs
fn spawn_progress_printer(orchestrator: &mut Orchestrator) -> tokio::task::JoinHandle<()> {
    let mut rx = orchestrator.events();
    tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            if let Some(label) = progress.label {
                eprintln!("{label}");
            }
            if progress.phase.is_terminal() {
                break;
            }
        }
    })
}

async fn summarize_one(
    orchestrator: &mut Orchestrator,
    url: &str,
    level: DetailLevel,
    format: OutputFormat,
) -> Result<()> {
    let printer = spawn_progress_printer(orchestrator);
    let outcome = orchestrator.summarize(url, level).await;
    let _ = printer.await;

    let result = outcome?;
    let rendered = match format {
        OutputFormat::Text => vidsum::output::render_text(&result),
        OutputFormat::Json => vidsum::output::render_json(&result)?,
    };
    println!("{rendered}");
    Ok(())
}

/// 1-based history position from user input
fn parse_position(arg: Option<&str>, len: usize) -> Result<usize> {
    let Some(arg) = arg else {
        bail!("missing history position");
    };
    let n: usize = arg.parse().map_err(|_| eyre::eyre!("not a number: {arg}"))?;
    if n == 0 || n > len {
        bail!("no history entry {n} (have {len})");
    }
    Ok(n - 1)
}

fn confirm(prompt: &str, lines: &mut impl Iterator<Item = io::Result<String>>) -> Result<bool> {
    eprint!("{prompt} [y/N] ");
    io::stderr().flush()?;
    let answer = lines.next().transpose()?.unwrap_or_default();
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

enum Flow {
    Continue,
    Quit,
}

fn run_command(
    orchestrator: &mut Orchestrator,
    level: &mut DetailLevel,
    line: &str,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> Result<Flow> {
    let mut parts = line.split_whitespace();
    let cmd = parts.next().unwrap_or_default();
    let arg = parts.next();

    match cmd {
        ":history" | ":h" => {
            println!("{}", vidsum::output::render_history(orchestrator.history().iter()));
        }
        ":fav" => {
            let idx = parse_position(arg, orchestrator.history().len())?;
            orchestrator.history_mut().toggle_favorite(idx);
        }
        ":rm" => {
            let idx = parse_position(arg, orchestrator.history().len())?;
            orchestrator.history_mut().remove(idx);
        }
        ":clear" => {
            if confirm("Clear all history?", lines)? {
                orchestrator.history_mut().clear();
                eprintln!("History cleared");
            }
        }
        ":level" => {
            let Some(arg) = arg else {
                eprintln!("Current level: {level}");
                return Ok(Flow::Continue);
            };
            *level = arg.parse().map_err(|e: String| eyre::eyre!(e))?;
            eprintln!("Detail level set to {level}");
        }
        ":quit" | ":q" => return Ok(Flow::Quit),
        other => bail!("unknown command: {other}"),
    }
    Ok(Flow::Continue)
}

async fn run_session(orchestrator: &mut Orchestrator, mut level: DetailLevel, format: OutputFormat) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        eprint!("vidsum ({level})> ");
        io::stderr().flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with(':') {
            match run_command(orchestrator, &mut level, line, &mut lines) {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => eprintln!("Error: {e}"),
            }
            continue;
        }

        // Failures are reported and the session carries on; resubmitting is the retry
        if let Err(e) = summarize_one(orchestrator, line, level, format).await {
            eprintln!("Error: {e}");
        }
        debug!("Request settled in phase {:?}", orchestrator.phase());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let mut config = vidsum::config::Config::load()
        .unwrap_or_else(|e| {
            warn!("Ignoring config file: {e}");
            vidsum::config::Config::default()
        })
        .with_env_overrides();

    // CLI flags take priority
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = Some(timeout);
    }
    let level = cli.level.unwrap_or_else(|| config.default_level());

    if cli.verbose {
        let config_path = vidsum::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
        eprintln!(
            "Transcripts: {}\nAI summaries: {}",
            if config.youtube_api_key().is_some() { "enabled" } else { "disabled" },
            if config.gemini_api_key().is_some() {
                config.gemini_model().to_string()
            } else {
                "disabled (template fallback)".to_string()
            },
        );
    }

    let mut orchestrator = Orchestrator::from_config(&config)?;
    debug!("Generative backend configured: {}", orchestrator.generator().is_configured());

    match cli.url {
        Some(ref url) => summarize_one(&mut orchestrator, url, level, cli.format).await?,
        None => run_session(&mut orchestrator, level, cli.format).await?,
    }

    if orchestrator.phase() == Phase::Failed {
        debug!("Last request failed: {:?}", orchestrator.state().error);
    }

    Ok(())
}
