//! Polish CLI - run enhancement cycles and manage settings from a terminal.
//!
//! ```text
//! polish enhance <objective> [--yes] [text...]   rewrite text (stdin when omitted)
//! polish config show                             print the current settings
//! polish config set key=value...                 change and persist settings
//! polish platforms                               list platform profiles
//! ```
//!
//! `enhance` stages the text in a single-field page, selects all of it, and runs
//! one full cycle: request, terminal preview, write-back. The resulting field
//! value goes to stdout; the preview and logs never do.

mod terminal;

use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Mutex;
use std::{env, io};

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufRead, AsyncReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use polish_config::{SettingKey, SettingsPatch, SettingsStore, config_path};
use polish_dom::{Document, NodeId};
use polish_engine::{CycleOutcome, Enhancer, SelectionTracker};
use polish_providers::{EnhancementClient, OpenAiChatTransport};
use polish_types::{ContentModel, PlatformProfile, ResponseSanitizer, Selector};

use crate::terminal::TerminalPresenter;

/// Host name of the staged page.
const TERMINAL_HOST: &str = "localhost";

/// Keystrokes fed to the preview under `--yes`.
const AUTO_ACCEPT: &[u8] = b"a\n";

const USAGE: &str = "\
usage: polish enhance <clarity|grammar|concise> [--yes] [text...]
       polish config show
       polish config set key=value...
       polish platforms";

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // stdout carries the enhanced text; without a log file, logs are dropped.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!("Failed to create log dir {}: {e}", parent.display()));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!("Failed to open log file {}: {e}", candidate.display()));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.polish/logs/polish.log
    if let Some(config_path) = config_path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("polish.log"));
    }

    candidates.push(PathBuf::from(".polish").join("logs").join("polish.log"));
    candidates
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Enhance {
        objective: String,
        text: Option<String>,
        auto_accept: bool,
    },
    ConfigShow,
    ConfigSet(Vec<String>),
    Platforms,
    Help,
}

fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        return Ok(Command::Help);
    };
    match command.as_str() {
        "enhance" => {
            let Some(objective) = args.next() else {
                bail!("missing objective\n{USAGE}");
            };
            let mut auto_accept = false;
            let mut words = Vec::new();
            for arg in args {
                if arg == "--yes" || arg == "-y" {
                    auto_accept = true;
                } else {
                    words.push(arg);
                }
            }
            let text = (!words.is_empty()).then(|| words.join(" "));
            Ok(Command::Enhance {
                objective,
                text,
                auto_accept,
            })
        }
        "config" => match args.next().as_deref() {
            Some("show") => Ok(Command::ConfigShow),
            Some("set") => {
                let assignments: Vec<String> = args.collect();
                if assignments.is_empty() {
                    bail!("config set needs at least one key=value\n{USAGE}");
                }
                Ok(Command::ConfigSet(assignments))
            }
            _ => bail!("unknown config command\n{USAGE}"),
        },
        "platforms" => Ok(Command::Platforms),
        "help" | "-h" | "--help" => Ok(Command::Help),
        other => bail!("unknown command: {other}\n{USAGE}"),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let command = parse_args(env::args().skip(1))?;
    if command == Command::Help {
        println!("{USAGE}");
        return Ok(());
    }

    let store = SettingsStore::load().context("failed to load settings")?;
    match command {
        Command::Enhance {
            objective,
            text,
            auto_accept,
        } => {
            let text = match text {
                Some(text) => text,
                None => read_stdin().await?,
            };
            let value = enhance(&store, &objective, &text, auto_accept).await?;
            println!("{value}");
        }
        Command::ConfigShow => show_config(&store),
        Command::ConfigSet(assignments) => {
            let patch = SettingsPatch::from_assignments(assignments.iter().map(String::as_str))?;
            let changed = store.set(&patch)?;
            if changed.is_empty() {
                println!("no changes");
            }
            for key in changed {
                println!("updated {key}");
            }
        }
        Command::Platforms => {
            for profile in store.get().platforms.iter() {
                println!(
                    "{}\t{}\t{}\t{}",
                    profile.name(),
                    profile.hosts().join(","),
                    profile.content_model().as_str(),
                    profile.surface()
                );
            }
        }
        Command::Help => {}
    }
    Ok(())
}

async fn read_stdin() -> Result<String> {
    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .context("failed to read text from stdin")?;
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    Ok(text)
}

/// Profile for the staged page: any textarea, plain model.
fn terminal_profile() -> Result<PlatformProfile> {
    Ok(PlatformProfile::new(
        "terminal",
        vec![TERMINAL_HOST.to_string()],
        Selector::parse("textarea")?,
        ContentModel::Plain,
        None,
    ))
}

/// A page with one focused textarea holding `text`, fully selected.
fn staged_page(text: &str) -> Result<(Document, NodeId)> {
    let mut doc = Document::new();
    doc.set_hostname(TERMINAL_HOST);
    let field = doc.create_element("textarea");
    doc.append_child(doc.body(), field)?;
    doc.set_field_value(field, text)?;
    doc.set_field_selection(field, 0, text.chars().count())?;
    doc.focus(field);
    Ok((doc, field))
}

async fn enhance(
    store: &SettingsStore,
    objective: &str,
    text: &str,
    auto_accept: bool,
) -> Result<String> {
    let settings = store.get();
    let (doc, field) = staged_page(text)?;
    let doc = Rc::new(RefCell::new(doc));
    let tracker = SelectionTracker::with_profile(
        &mut doc.borrow_mut(),
        Some(terminal_profile()?),
        settings.ui,
    )?;

    let transport = OpenAiChatTransport::new(settings.provider.endpoint.clone());
    let client = EnhancementClient::new(transport)
        .with_sanitizer(ResponseSanitizer::new(settings.provider.quote_policy));
    let input: Box<dyn AsyncBufRead + Unpin> = if auto_accept {
        Box::new(AUTO_ACCEPT)
    } else {
        Box::new(BufReader::new(tokio::io::stdin()))
    };
    let presenter = TerminalPresenter::new(input, io::stderr());
    let enhancer =
        Enhancer::with_tracker(Rc::clone(&doc), tracker, client, presenter, store.watch());

    enhancer.selection_changed();
    match enhancer.run(objective).await {
        CycleOutcome::Applied { .. } => eprintln!(),
        CycleOutcome::Cancelled | CycleOutcome::Superseded => eprintln!("\nkept the original text"),
        CycleOutcome::Failed(err) => bail!(err.notice().unwrap_or_else(|| err.to_string())),
    }

    let doc = doc.borrow();
    let value = doc.field(field).map(|f| f.value.clone()).unwrap_or_default();
    Ok(value)
}

fn show_config(store: &SettingsStore) {
    let settings = store.get();
    if let Some(path) = store.path() {
        println!("# {}", path.display());
    }
    let values = store.values(&SettingKey::ALL);
    for key in SettingKey::ALL {
        let value = values.get(&key).map_or("(unset)", String::as_str);
        println!("{key} = {value}");
    }
    println!("endpoint = {}", settings.provider.endpoint);
    println!("quotePolicy = {}", settings.provider.quote_policy.as_str());
}
