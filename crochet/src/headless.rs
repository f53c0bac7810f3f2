//! Line-oriented console over a crochet session.
//!
//! Protocol, one line at a time:
//! - `@<character> <text>` records a character reply to the last prompt
//! - Lines starting with `#` are commands (history, path, traits, save, quit)
//! - Any other line is a user message

use crochet_core::{CrochetConfig, CrochetSession, CrochetThread, NodeId, Result};
use std::fmt::Write as _;
use std::io::{self, BufRead, Write};
use tracing::warn;

/// Which thread the console works on.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessConfig {
    pub thread_id: String,
    pub name: String,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            thread_id: "default".to_string(),
            name: "Untitled thread".to_string(),
        }
    }
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Say(String),
    Respond { character: String, text: String },
    History(Option<String>),
    Path { from: String, to: String },
    Traits(String),
    Save,
    Help,
    Quit,
    Usage(&'static str),
    Unknown(String),
}

/// What the console should do after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Continue(String),
    Quit,
}

const HELP: &str = "\
[HELP]
  <text>              - Say something as the user
  @<character> <text> - Record a character's reply
  #history [char]     - Show the conversation, optionally one character's view
  #path <from> <to>   - Shortest reply path between two nodes (id or prefix)
  #traits <char>      - Show a character's personality
  #save               - Save the thread and all personalities
  #quit               - Exit
  #help               - Show this help";

/// Parse an input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(rest) = line.strip_prefix('@') {
        return Some(match rest.split_once(char::is_whitespace) {
            Some((character, text)) if !character.is_empty() && !text.trim().is_empty() => {
                Command::Respond {
                    character: character.to_string(),
                    text: text.trim().to_string(),
                }
            }
            _ => Command::Usage("@<character> <text>"),
        });
    }

    let Some(rest) = line.strip_prefix('#') else {
        return Some(Command::Say(line.to_string()));
    };
    let parts: Vec<&str> = rest.split_whitespace().collect();
    Some(match parts.as_slice() {
        ["history"] => Command::History(None),
        ["history", character] => Command::History(Some(character.to_string())),
        ["path", from, to] => Command::Path {
            from: from.to_string(),
            to: to.to_string(),
        },
        ["path", ..] => Command::Usage("#path <from> <to>"),
        ["traits", character] => Command::Traits(character.to_string()),
        ["traits", ..] => Command::Usage("#traits <character>"),
        ["save"] => Command::Save,
        ["help"] => Command::Help,
        ["quit"] | ["exit"] => Command::Quit,
        _ => Command::Unknown(rest.to_string()),
    })
}

/// Find a node by full id or unique id prefix.
fn resolve_node(thread: &CrochetThread, key: &str) -> Option<NodeId> {
    if let Ok(id) = key.parse::<NodeId>() {
        return thread.contains(id).then_some(id);
    }
    let mut matches = thread
        .nodes()
        .iter()
        .map(|node| node.id)
        .filter(|id| id.to_string().starts_with(key));
    match (matches.next(), matches.next()) {
        (Some(id), None) => Some(id),
        _ => None,
    }
}

fn short(id: NodeId) -> String {
    id.to_string().chars().take(8).collect()
}

/// A session bound to one thread.
pub struct Console {
    session: CrochetSession,
    thread: CrochetThread,
}

impl Console {
    pub async fn open(config: CrochetConfig, headless: &HeadlessConfig) -> Result<Self> {
        let session = CrochetSession::open(config).await?;
        let thread = session
            .open_thread(&headless.thread_id, &headless.name)
            .await?;
        Ok(Self { session, thread })
    }

    pub fn thread(&self) -> &CrochetThread {
        &self.thread
    }

    /// Run one command, saving whatever it changed.
    pub async fn execute(&mut self, command: Command) -> Result<Flow> {
        let mut out = String::new();
        match command {
            Command::Say(text) => {
                let id = self.session.record_user_message(&mut self.thread, &text);
                self.session.save_thread(&self.thread).await?;
                let _ = write!(out, "[USER {}]", short(id));
            }
            Command::Respond { character, text } => {
                let reply = self
                    .session
                    .record_response(&mut self.thread, &character, &text)
                    .await?;
                self.session.save_thread(&self.thread).await?;
                let traits: Vec<&str> = reply.observations.keys().map(String::as_str).collect();
                let _ = write!(out, "[{character} {}]", short(reply.node_id));
                if !traits.is_empty() {
                    let _ = write!(out, " traits: {}", traits.join(", "));
                }
            }
            Command::History(character) => {
                let history = self.thread.conversation_history(character.as_deref());
                if history.is_empty() {
                    out.push_str("[HISTORY] (empty)");
                }
                for (i, message) in history.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    let speaker = message.character_id.as_deref().unwrap_or(message.role.as_str());
                    let _ = write!(out, "{} {speaker}: {}", short(message.id), message.content);
                }
            }
            Command::Path { from, to } => {
                match (resolve_node(&self.thread, &from), resolve_node(&self.thread, &to)) {
                    (Some(start), Some(end)) => {
                        let path = self.thread.get_conversation_path(start, end);
                        if path.is_empty() {
                            out.push_str("[PATH] no path");
                        } else {
                            let hops: Vec<String> = path.into_iter().map(short).collect();
                            let _ = write!(out, "[PATH] {}", hops.join(" -> "));
                        }
                    }
                    _ => out.push_str("[ERROR] Unknown or ambiguous node"),
                }
            }
            Command::Traits(character) => match self.session.personalities().profile(&character) {
                Some(profile) => {
                    let _ = write!(out, "[TRAITS] {character}");
                    for t in profile.traits() {
                        let _ = write!(out, "\n  {:<18} {:.3}", t.name(), t.value());
                    }
                }
                None => {
                    let _ = write!(out, "[ERROR] No personality for {character}");
                }
            },
            Command::Save => {
                self.session.save_thread(&self.thread).await?;
                self.session.personalities().save_profiles().await?;
                let _ = write!(out, "[SAVED] {}", self.thread.thread_id());
            }
            Command::Help => out.push_str(HELP),
            Command::Quit => return Ok(Flow::Quit),
            Command::Usage(usage) => {
                let _ = write!(out, "[ERROR] Usage: {usage}");
            }
            Command::Unknown(_) => out.push_str("[ERROR] Unknown command. Type #help for help."),
        }
        Ok(Flow::Continue(out))
    }
}

/// Run the console on stdin until `#quit` or end of input.
pub async fn run_headless(config: CrochetConfig, headless: HeadlessConfig) -> Result<()> {
    let mut console = Console::open(config, &headless).await?;

    println!("=== Crochet ===");
    println!(
        "Thread: {} ({}), {} nodes",
        console.thread().name(),
        console.thread().thread_id(),
        console.thread().node_count()
    );
    println!("Type #help for commands.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };
        let Some(command) = parse_line(&line) else {
            continue;
        };

        match console.execute(command).await {
            Ok(Flow::Continue(output)) => println!("{output}"),
            Ok(Flow::Quit) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => {
                warn!(error = %e, "command failed");
                println!("[ERROR] {e}");
            }
        }
        stdout.flush().ok();
    }

    Ok(())
}

/// Parse thread selection from command line arguments.
pub fn parse_config_from_args(args: &[String]) -> HeadlessConfig {
    let mut config = HeadlessConfig::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--thread" => {
                if let Some(id) = args.get(i + 1) {
                    config.thread_id = id.clone();
                    i += 1;
                }
            }
            "--name" => {
                if let Some(name) = args.get(i + 1) {
                    config.name = name.clone();
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    config
}
