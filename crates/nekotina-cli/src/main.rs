use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use image::ImageFormat;
use nekotina_contracts::chat::{parse_command, ChatCommand, CHAT_HELP_COMMANDS};
use nekotina_contracts::conversation::{ImageRef, Role, Turn};
use nekotina_contracts::events::EventWriter;
use nekotina_engine::captions;
use nekotina_engine::config::parse_timeout_seconds;
use nekotina_engine::{Backend, EngineConfig, GeminiBackend, TurnOrchestrator};

#[derive(Debug, Parser)]
#[command(name = "nekotina", version, about = "Nekotina multimodal chat client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive chat session.
    Chat(ChatArgs),
    /// Send a single turn and print the reply.
    Send(SendArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[arg(long)]
    image_model: Option<String>,
    #[arg(long)]
    edit_model: Option<String>,
    #[arg(long)]
    chat_model: Option<String>,
    #[arg(long)]
    context_limit: Option<usize>,
    /// Request timeout in seconds.
    #[arg(long)]
    timeout: Option<String>,
    /// File holding the persona prompt.
    #[arg(long)]
    system_prompt: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct ChatArgs {
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Debug, Parser)]
struct SendArgs {
    #[arg(long, default_value = "")]
    prompt: String,
    #[arg(long)]
    image: Option<PathBuf>,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[command(flatten)]
    config: ConfigArgs,
}

const HISTORY_PREVIEW_CHARS: usize = 80;

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("nekotina error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Chat(args) => {
            run_chat(args)?;
            Ok(0)
        }
        Command::Send(args) => run_send(args),
    }
}

fn load_config(args: &ConfigArgs) -> Result<EngineConfig> {
    apply_config_flags(EngineConfig::from_env()?, args)
}

/// Flags win over whatever the environment set.
fn apply_config_flags(mut config: EngineConfig, args: &ConfigArgs) -> Result<EngineConfig> {
    if let Some(model) = args.image_model.clone() {
        config.image_model = Some(model);
    }
    if let Some(model) = args.edit_model.clone() {
        config.edit_model = Some(model);
    }
    if let Some(model) = args.chat_model.clone() {
        config.chat_model = Some(model);
    }
    if let Some(limit) = args.context_limit {
        config.context_limit = limit.max(1);
    }
    if let Some(raw) = args.timeout.as_deref() {
        config.request_timeout = Some(parse_timeout_seconds(raw)?);
    }
    if let Some(path) = args.system_prompt.clone() {
        config.system_prompt_file = Some(path);
    }
    Ok(config)
}

struct Session {
    orchestrator: TurnOrchestrator,
    backend: GeminiBackend,
    out_dir: PathBuf,
    saved_images: usize,
}

impl Session {
    fn open(config_args: &ConfigArgs, out: &Path, events: Option<&Path>) -> Result<Self> {
        fs::create_dir_all(out)
            .with_context(|| format!("failed to create output dir {}", out.display()))?;
        let config = load_config(config_args)?;
        let (settings, warnings) = config.orchestrator_settings()?;
        for warning in warnings {
            eprintln!("nekotina: {warning}");
        }
        let backend = GeminiBackend::new(&config).context("failed to build HTTP client")?;
        if !backend.is_configured() {
            eprintln!(
                "nekotina: no API key set (NEKOTINA_API_KEY, GEMINI_API_KEY or GOOGLE_API_KEY); replies will fail."
            );
        }
        let events_path = events
            .map(Path::to_path_buf)
            .unwrap_or_else(|| out.join("events.jsonl"));
        let conversation_id = format!("conversation-{}", Utc::now().format("%Y%m%dT%H%M%S%3f"));
        let events = EventWriter::new(events_path, conversation_id);
        eprintln!(
            "nekotina: {} events go to {}",
            events.conversation_id(),
            events.path().display()
        );
        let orchestrator = TurnOrchestrator::new(settings).with_events(events);
        Ok(Self {
            orchestrator,
            backend,
            out_dir: out.to_path_buf(),
            saved_images: 0,
        })
    }

    /// Sends one turn, printing the placeholder while the backend works.
    /// Returns the settled reply, or `None` when there was nothing to send.
    fn send_turn(&mut self, text: &str) -> Result<Option<Turn>> {
        let Some(pending) = self.orchestrator.begin_submit(text) else {
            return Ok(None);
        };
        let status = self
            .orchestrator
            .conversation()
            .placeholder()
            .and_then(Turn::text)
            .unwrap_or(captions::PROCESSING);
        println!("  … {status}");
        io::stdout().flush()?;

        let result = self.backend.execute(pending.request());
        let Some(reply) = self.orchestrator.complete_submit(pending, result).cloned() else {
            bail!("reply could not be appended to the conversation");
        };
        self.print_reply(&reply)?;
        Ok(Some(reply))
    }

    fn print_reply(&mut self, turn: &Turn) -> Result<()> {
        print_turn(turn);
        if let Some(image) = turn.image() {
            self.saved_images += 1;
            let saved = save_reply_image(&self.out_dir, image, self.saved_images)?;
            match saved.dimensions {
                Some((width, height)) => println!(
                    "  [imagem {width}x{height} salva em {}]",
                    saved.path.display()
                ),
                None => println!("  [imagem salva em {}]", saved.path.display()),
            }
        }
        Ok(())
    }
}

fn run_chat(args: ChatArgs) -> Result<()> {
    let mut session = Session::open(&args.config, &args.out, args.events.as_deref())?;
    let stdin = io::stdin();
    let mut line = String::new();

    println!("Nekotina chat started. Type /help for commands.");
    for turn in session.orchestrator.turns() {
        print_turn(turn);
    }
    println!("{}", captions::USAGE_TIP);

    loop {
        let prompt = if session.orchestrator.pending_attachment().is_some() {
            "📎 > "
        } else {
            "> "
        };
        print!("{prompt}");
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let input = line.trim_end_matches(['\n', '\r']);
        match parse_command(input) {
            ChatCommand::Noop => {
                // A blank line still sends a pending image on its own.
                if session.orchestrator.pending_attachment().is_some() {
                    session.send_turn("")?;
                }
            }
            ChatCommand::Help => {
                println!("Commands: {}", CHAT_HELP_COMMANDS.join(" "));
                println!("{}", captions::USAGE_TIP);
            }
            ChatCommand::Attach(path) => {
                if path.is_empty() {
                    println!("/attach requires a path");
                    continue;
                }
                match session.orchestrator.select_attachment(Path::new(&path)) {
                    Ok(attachment) => println!(
                        "Attached {path} ({}, {} bytes)",
                        attachment.media_type(),
                        attachment.byte_len()
                    ),
                    Err(err) => println!("Attach failed: {err}"),
                }
                println!("{}", session.orchestrator.input_hint());
            }
            ChatCommand::Detach => {
                if session.orchestrator.clear_attachment().is_some() {
                    println!("Attachment cleared.");
                } else {
                    println!("No attachment pending.");
                }
            }
            ChatCommand::Reset => {
                if !confirm(&stdin, "Apagar toda a conversa? [y/N] ")? {
                    println!("Reset cancelled.");
                    continue;
                }
                if session.orchestrator.reset_conversation() {
                    for turn in session.orchestrator.turns() {
                        print_turn(turn);
                    }
                }
            }
            ChatCommand::History => {
                for (idx, turn) in session.orchestrator.turns().enumerate() {
                    println!("{:>3}. {}", idx + 1, history_line(turn));
                }
            }
            ChatCommand::Quit => break,
            ChatCommand::Unknown { command, .. } => {
                println!("Unknown command: /{command}. Type /help for commands.");
            }
            ChatCommand::Message(text) => {
                session.send_turn(&text)?;
            }
        }
    }
    Ok(())
}

fn run_send(args: SendArgs) -> Result<i32> {
    let mut session = Session::open(&args.config, &args.out, args.events.as_deref())?;
    if let Some(path) = args.image.as_deref() {
        session
            .orchestrator
            .select_attachment(path)
            .with_context(|| format!("failed to attach {}", path.display()))?;
    }
    let Some(reply) = session.send_turn(&args.prompt)? else {
        bail!("nothing to send: pass --prompt and/or --image");
    };
    Ok(if reply.is_failed() { 2 } else { 0 })
}

fn confirm(stdin: &io::Stdin, prompt: &str) -> Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut answer = String::new();
    stdin.read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "s" | "sim"
    )
}

fn speaker(turn: &Turn) -> &'static str {
    match turn.role() {
        Role::User => "você",
        Role::Assistant => "nekotina",
    }
}

fn print_turn(turn: &Turn) {
    let text = turn.text().unwrap_or_default();
    if turn.is_failed() {
        println!("{}: {text} (falhou)", speaker(turn));
    } else if !text.is_empty() {
        println!("{}: {text}", speaker(turn));
    }
}

fn history_line(turn: &Turn) -> String {
    let mut line = format!("[{}] {}", turn.created_at(), speaker(turn));
    if let Some(text) = turn.text() {
        line.push_str(": ");
        line.push_str(&clamp_text(text, HISTORY_PREVIEW_CHARS));
    }
    if let Some(image) = turn.image() {
        line.push_str(&format!(" [{} {} bytes]", image.media_type(), image.len()));
    }
    if turn.is_transient() {
        line.push_str(" (aguardando)");
    }
    if turn.is_failed() {
        line.push_str(" (falhou)");
    }
    line
}

fn clamp_text(text: &str, max_chars: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    single_line.chars().take(max_chars).collect::<String>() + "…"
}

struct SavedImage {
    path: PathBuf,
    dimensions: Option<(u32, u32)>,
}

fn output_extension_for_mime(media_type: &str) -> &'static str {
    ImageFormat::from_mime_type(media_type)
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("png")
}

fn reply_file_name(stamp: &str, index: usize, media_type: &str) -> String {
    format!(
        "reply-{stamp}-{index:02}.{}",
        output_extension_for_mime(media_type)
    )
}

fn save_reply_image(out_dir: &Path, image: &ImageRef, index: usize) -> Result<SavedImage> {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S").to_string();
    let path = out_dir.join(reply_file_name(&stamp, index, image.media_type()));
    fs::write(&path, image.bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    let dimensions = image::load_from_memory(image.bytes())
        .ok()
        .map(|decoded| (decoded.width(), decoded.height()));
    Ok(SavedImage { path, dimensions })
}
