use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use lib::channel;
use lib::config::{self, Config};
use lib::history::{HistoryApi, HistoryClient};
use lib::session::Sender;
use lib::ui::render::render_transcript_message;
use lib::ui::{Activity, ConnectionState, Coordinator, Effect, EffectRunner, UiEvent};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Parley CLI", long_about = None)]
struct Cli {
    /// Config file path (default: PARLEY_CONFIG_PATH or ~/.parley/config.json)
    #[arg(long, short, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Write a default configuration file if none exists.
    Init,

    /// Start an agent mode and answer its input requests interactively.
    Run {
        /// Mode id (prompted for when omitted)
        mode: Option<String>,
    },

    /// List past sessions, newest last.
    Sessions,

    /// Print the transcript of a past session.
    Show { id: String },

    /// Rename a past session.
    Rename { id: String, name: String },

    /// Delete a past session.
    Delete {
        id: String,

        /// Do not ask for confirmation.
        #[arg(long, short)]
        yes: bool,
    },

    /// Save a session transcript as a text file.
    Download {
        id: String,

        /// Output file (default: the name suggested by the server)
        #[arg(long, short, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config_path = cli.config;

    let result = match cli.command {
        Some(Commands::Version) => {
            println!("parley {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Init) => run_init(config_path),
        Some(Commands::Run { mode }) => run_mode(config_path, mode).await,
        Some(Commands::Sessions) => list_sessions(config_path).await,
        Some(Commands::Show { id }) => show_session(config_path, &id).await,
        Some(Commands::Rename { id, name }) => rename_session(config_path, &id, &name).await,
        Some(Commands::Delete { id, yes }) => delete_session(config_path, &id, yes).await,
        Some(Commands::Download { id, output }) => download_session(config_path, &id, output).await,
        None => {
            println!("Run with --help for usage");
            Ok(())
        }
    };
    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
    // A stdin read abandoned by `run` would otherwise keep the runtime alive.
    std::process::exit(0);
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(config::default_config_path);
    if config::write_default_config(&path)? {
        println!("wrote default configuration to {}", path.display());
    } else {
        println!("configuration already exists at {}", path.display());
    }
    Ok(())
}

fn history_client(config: &Config) -> anyhow::Result<HistoryClient> {
    let base_url = config::resolve_server_url(config);
    HistoryClient::new(&base_url).with_context(|| format!("server url {}", base_url))
}

fn connect(config_path: Option<PathBuf>) -> anyhow::Result<(Config, HistoryClient)> {
    let (config, path) = config::load_config(config_path)?;
    log::debug!("loaded config from {}", path.display());
    let client = history_client(&config)?;
    Ok((config, client))
}

fn read_line(prompt: &str) -> io::Result<Option<String>> {
    let mut stdout = io::stdout();
    write!(stdout, "{} ", prompt)?;
    stdout.flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

async fn read_line_async(prompt: String) -> anyhow::Result<Option<String>> {
    let line = tokio::task::spawn_blocking(move || read_line(&prompt)).await??;
    Ok(line)
}

fn choose_mode(config: &Config) -> anyhow::Result<String> {
    println!("Select a mode:");
    for m in &config.modes {
        println!("  {}  {}", m.id, m.label);
    }
    match read_line("mode>")? {
        Some(choice) if !choice.trim().is_empty() => Ok(choice.trim().to_string()),
        _ => bail!("no mode selected"),
    }
}

/// What woke the run loop: a finished stdin read or a queued event.
#[derive(Debug)]
enum Wake {
    Line(Option<String>),
    Event(UiEvent),
}

type StdinRead = JoinHandle<io::Result<Option<String>>>;

/// Wait for the pending stdin read, if any, or the next event, whichever comes first.
/// A read that loses the race stays pending for the next call.
async fn next_wake(
    stdin_read: &mut Option<StdinRead>,
    events: &mut mpsc::UnboundedReceiver<UiEvent>,
) -> anyhow::Result<Wake> {
    let woke = match stdin_read.as_mut() {
        Some(read) => tokio::select! {
            line = read => Ok(line),
            event = events.recv() => Err(event),
        },
        None => Err(events.recv().await),
    };
    match woke {
        Ok(line) => {
            *stdin_read = None;
            Ok(Wake::Line(line??))
        }
        Err(Some(event)) => Ok(Wake::Event(event)),
        Err(None) => bail!("event queue closed"),
    }
}

async fn run_mode(config_path: Option<PathBuf>, mode: Option<String>) -> anyhow::Result<()> {
    let (config, api) = connect(config_path)?;
    let mode = match mode {
        Some(m) => m,
        None => choose_mode(&config)?,
    };

    let server_url = config::resolve_server_url(&config);
    let (tx, mut events) = mpsc::unbounded_channel::<UiEvent>();
    let sender = channel::spawn(&Handle::current(), server_url.clone(), tx.clone());
    let runner = EffectRunner::new(Arc::new(api), sender, tx, Handle::current());

    let mut coordinator = Coordinator::new();
    let mut host = runner.run(coordinator.dispatch(UiEvent::StartMode(mode)));
    let mut printed = 0;
    let mut stdin_read: Option<StdinRead> = None;

    loop {
        let state = coordinator.state();
        for message in &state.transcript[printed..] {
            if message.sender == Sender::Agent {
                println!("{}\n", message.plain_text());
            }
        }
        printed = state.transcript.len();

        if state.activity == Activity::Finished {
            println!("[session finished]");
            return Ok(());
        }
        if state.connection == ConnectionState::Offline {
            bail!("lost connection to {}", server_url);
        }

        if host.contains(&Effect::FocusInput) && stdin_read.is_none() {
            let prompt = state
                .pending_input
                .as_ref()
                .map(|p| p.prompt.clone())
                .unwrap_or_default();
            stdin_read = Some(tokio::task::spawn_blocking(move || read_line(&prompt)));
        }
        host.clear();

        let event = match next_wake(&mut stdin_read, &mut events).await? {
            Wake::Line(Some(line)) => {
                coordinator.dispatch(UiEvent::InputChanged(line));
                UiEvent::SubmitInput
            }
            Wake::Line(None) => bail!("stdin closed while input was requested"),
            Wake::Event(event) => event,
        };
        host = runner.run(coordinator.dispatch(event));
    }
}

async fn list_sessions(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let (_, api) = connect(config_path)?;
    let sessions = api.list_sessions().await?;
    if sessions.is_empty() {
        println!("no sessions");
    }
    for s in sessions {
        let mode = s.mode.as_deref().map(|m| format!("  [mode {}]", m)).unwrap_or_default();
        println!("{}  {}  {}{}", s.id, s.time_label(), s.name, mode);
    }
    Ok(())
}

async fn show_session(config_path: Option<PathBuf>, id: &str) -> anyhow::Result<()> {
    let (_, api) = connect(config_path)?;
    let transcript = api
        .transcript(id)
        .await
        .with_context(|| format!("session {}", id))?;
    for message in &transcript {
        let label = match message.sender {
            Sender::User => "you",
            Sender::Agent => "agent",
        };
        println!("[{}]\n{}\n", label, render_transcript_message(message).plain_text());
    }
    Ok(())
}

async fn rename_session(config_path: Option<PathBuf>, id: &str, name: &str) -> anyhow::Result<()> {
    if name.is_empty() {
        bail!("name must not be empty");
    }
    let (_, api) = connect(config_path)?;
    api.rename_session(id, name)
        .await
        .with_context(|| format!("rename session {}", id))?;
    println!("renamed {} to {}", id, name);
    Ok(())
}

async fn delete_session(config_path: Option<PathBuf>, id: &str, yes: bool) -> anyhow::Result<()> {
    let (_, api) = connect(config_path)?;
    if !yes {
        let sessions = api.list_sessions().await?;
        let name = sessions
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| id.to_string());
        let answer = read_line_async(format!("Delete session '{}'? [y/N]", name)).await?;
        if !matches!(answer.as_deref().map(str::trim), Some("y") | Some("Y")) {
            println!("cancelled");
            return Ok(());
        }
    }
    api.delete_session(id)
        .await
        .with_context(|| format!("delete session {}", id))?;
    println!("deleted {}", id);
    Ok(())
}

async fn download_session(
    config_path: Option<PathBuf>,
    id: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let (_, api) = connect(config_path)?;
    let file = api
        .download(id)
        .await
        .with_context(|| format!("download session {}", id))?;
    let path = output.unwrap_or_else(|| output_file_name(file.file_name.as_deref(), id));
    std::fs::write(&path, &file.bytes).with_context(|| format!("write {}", path.display()))?;
    println!("saved {}", path.display());
    Ok(())
}

/// Server-suggested names may carry characters that are not valid in a path component.
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

/// Local file name for a download: the sanitized suggestion, or `<id>.txt` when
/// there is none or it would name the current or parent directory.
fn output_file_name(suggested: Option<&str>, id: &str) -> PathBuf {
    let name = suggested
        .map(sanitize_file_name)
        .filter(|n| !matches!(n.trim(), "" | "." | ".."));
    PathBuf::from(name.unwrap_or_else(|| format!("{}.txt", sanitize_file_name(id))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_lose_path_separators() {
        assert_eq!(sanitize_file_name("Mode 1 - 10:42.txt"), "Mode 1 - 10_42.txt");
        assert_eq!(sanitize_file_name("../etc/passwd"), ".._etc_passwd");
    }

    #[test]
    fn download_names_fall_back_to_session_id() {
        assert_eq!(output_file_name(Some("Planning.txt"), "s1"), PathBuf::from("Planning.txt"));
        for bad in [None, Some(""), Some("."), Some(".."), Some(" .. ")] {
            assert_eq!(output_file_name(bad, "s1"), PathBuf::from("s1.txt"), "{:?}", bad);
        }
        assert_eq!(output_file_name(Some("../x"), "s1"), PathBuf::from(".._x"));
    }

    #[tokio::test]
    async fn events_are_handled_while_stdin_read_is_pending() {
        let (tx, mut events) = mpsc::unbounded_channel();
        let mut stdin_read: Option<StdinRead> = Some(tokio::spawn(std::future::pending()));
        tx.send(UiEvent::DismissNotice).unwrap();

        let wake = next_wake(&mut stdin_read, &mut events).await.unwrap();
        assert!(matches!(wake, Wake::Event(UiEvent::DismissNotice)));
        assert!(stdin_read.is_some());
    }

    #[tokio::test]
    async fn finished_stdin_read_wins() {
        let (_tx, mut events) = mpsc::unbounded_channel();
        let mut stdin_read: Option<StdinRead> = Some(tokio::spawn(async { Ok(Some("Ada".to_string())) }));

        let wake = next_wake(&mut stdin_read, &mut events).await.unwrap();
        assert!(matches!(wake, Wake::Line(Some(ref line)) if line == "Ada"));
        assert!(stdin_read.is_none());
    }

    #[tokio::test]
    async fn closed_queue_is_an_error() {
        let (tx, mut events) = mpsc::unbounded_channel::<UiEvent>();
        drop(tx);
        assert!(next_wake(&mut None, &mut events).await.is_err());
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["parley", "delete", "s1", "--yes", "-c", "/tmp/c.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
        assert!(matches!(cli.command, Some(Commands::Delete { ref id, yes: true }) if id == "s1"));
    }
}
