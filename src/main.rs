use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use colregs_lights::config::{AppConfig, ConfigError};
use colregs_lights::practice::{self, PracticeCommand};
use colregs_lights::remote::{RemoteError, RemoteStore};
use colregs_lights::server::{self, ServerError};
use colregs_lights::session::{PatternSession, Role, SaveFlow, SessionError, ShareOutcome};
use colregs_lights::store::{FileStore, LocalPresets, StoreError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("preset not found: {0}")]
    NotFound(String),
}

#[derive(Parser, Debug)]
#[command(name = "colregs", about = "COLREGS signal-light practice")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the presets service.
    Serve,
    /// Start an interactive practice session.
    Practice(PracticeArgs),
    Presets(PresetsCommand),
}

#[derive(Args, Debug)]
struct PracticeArgs {
    /// Share link or query string naming a preset to open.
    #[arg(long)]
    link: Option<String>,

    #[arg(long, default_value_t = false)]
    student: bool,
}

#[derive(Args, Debug)]
struct PresetsCommand {
    #[command(subcommand)]
    command: PresetsSubcommand,
}

#[derive(Subcommand, Debug)]
enum PresetsSubcommand {
    List {
        /// Also list presets from the presets service.
        #[arg(long, default_value_t = false)]
        public: bool,
    },
    Show {
        id: String,
    },
    Delete {
        id: String,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command {
        Command::Serve => Ok(server::serve(&config).await?),
        Command::Practice(args) => run_practice(&config, args).await,
        Command::Presets(presets) => run_presets(&config, presets).await,
    }
}

// =============================================================================
// PRESETS
// =============================================================================

async fn run_presets(config: &AppConfig, presets: PresetsCommand) -> Result<(), CliError> {
    let mut local = LocalPresets::load(config.local_store());
    match presets.command {
        PresetsSubcommand::List { public } => {
            for preset in local.presets().iter() {
                println!("{}", practice::describe_preset(preset));
            }
            if public {
                let remote = require_remote(config)?;
                for preset in remote.fetch_public(config.public_limit).await? {
                    println!("[public] {}", practice::describe_preset(&preset));
                }
            }
            Ok(())
        }
        PresetsSubcommand::Show { id } => {
            let preset = match local.get(&id) {
                Some(preset) => preset.clone(),
                None => require_remote(config)?
                    .fetch_by_id(&id)
                    .await?
                    .ok_or_else(|| CliError::NotFound(id.clone()))?,
            };
            println!("{}", practice::describe_preset(&preset));
            println!("{}", practice::render_preset(&preset));
            Ok(())
        }
        PresetsSubcommand::Delete { id, yes } => {
            let Some(preset) = local.get(&id) else {
                return Err(CliError::NotFound(id));
            };
            let mut input = BufReader::new(tokio::io::stdin()).lines();
            if !yes && !confirm(&mut input, &format!("delete '{}'?", preset.name)).await? {
                println!("kept");
                return Ok(());
            }
            local.delete(&id)?;
            println!("deleted {id}");
            Ok(())
        }
    }
}

fn require_remote(config: &AppConfig) -> Result<Arc<dyn RemoteStore>, CliError> {
    config.remote()?.ok_or(CliError::Remote(RemoteError::NotConfigured))
}

async fn confirm(input: &mut Input, question: &str) -> Result<bool, CliError> {
    prompt(&format!("{question} [y/N] ")).await?;
    let answer = input.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

async fn prompt(text: &str) -> Result<(), CliError> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

// =============================================================================
// PRACTICE
// =============================================================================

async fn run_practice(config: &AppConfig, args: PracticeArgs) -> Result<(), CliError> {
    let local = LocalPresets::load(config.local_store());
    let role = if args.student { Role::Student } else { Role::Teacher };
    let mut session = PatternSession::new(local, config.remote()?, config.session_options()).with_role(role);
    if !session.is_online() {
        println!("offline: presets are kept on this machine only");
    }
    if let Err(e) = session.start(args.link.as_deref()).await {
        println!("could not open shared preset: {e}");
    }
    if let Some(preset) = session.comparison() {
        println!("opened shared preset '{}'", preset.name);
        println!("{}", practice::render_preset(preset));
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", practice::HELP);
    loop {
        prompt(&format!("{}> ", role_label(session.role()))).await?;
        let Some(line) = input.next_line().await? else {
            break;
        };
        let command = match practice::parse_command(&line) {
            Ok(command) => command,
            Err(practice::CommandError::Empty) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        if command == PracticeCommand::Quit {
            break;
        }
        if let Err(e) = run_command(&mut session, &mut input, command).await {
            println!("error: {e}");
        }
    }
    Ok(())
}

async fn run_command(
    session: &mut PatternSession<FileStore>,
    input: &mut Input,
    command: PracticeCommand,
) -> Result<(), CliError> {
    match command {
        PracticeCommand::Toggle(cell) => {
            session.toggle_light(cell);
            println!("{}", practice::render_grid(session.grid()));
        }
        PracticeCommand::Color(color) => {
            session.select_color(color);
            println!("colour: {color}");
        }
        PracticeCommand::Reset => {
            session.reset_grid();
            println!("{}", practice::render_grid(session.grid()));
        }
        PracticeCommand::Name(name) => session.set_name(name),
        PracticeCommand::Description(description) => session.set_description(description),
        PracticeCommand::Save => {
            let preset = session.save_local()?;
            println!("saved {}", practice::describe_preset(&preset));
        }
        PracticeCommand::Share => match session.save_and_share().await? {
            ShareOutcome::Shared { preset, link, .. } => {
                println!("saved {}", practice::describe_preset(&preset));
                println!("share link: {link}");
            }
            ShareOutcome::LocalOnly { preset, error } => {
                println!("saved {}", practice::describe_preset(&preset));
                println!("not shared: {error}");
            }
        },
        PracticeCommand::List => {
            let public = session.public_presets();
            if let Some(error) = &public.error {
                println!("public presets unavailable: {error}");
            }
            let carousel = session.carousel();
            if carousel.is_empty() {
                println!("no presets yet");
            }
            for preset in carousel {
                println!("{}", practice::describe_preset(preset));
            }
        }
        PracticeCommand::Refresh => {
            session.refresh_public().await;
            println!("{} public presets", session.public_presets().presets.len());
        }
        PracticeCommand::Select(id) => {
            let preset = session.select_preset(&id)?;
            println!("selected '{}' (hidden, use reveal)", preset.name);
        }
        PracticeCommand::Reveal => {
            if !session.toggle_reveal() {
                println!("nothing selected");
            } else if let Some(preset) = session.comparison() {
                println!("{}", practice::render_preset(preset));
            } else {
                println!("hidden");
            }
        }
        PracticeCommand::Apply => {
            if session.apply_selected() {
                println!("{}", practice::render_grid(session.grid()));
            } else {
                println!("only a selected local preset can be applied");
            }
        }
        PracticeCommand::Clear => session.clear_selection(),
        PracticeCommand::Compare => match session.compare_with_selection() {
            Some(diff) => println!("{}", practice::render_diff(&diff)),
            None => println!("reveal a preset first"),
        },
        PracticeCommand::Delete(id) => {
            let question = match session.local_presets().get(&id) {
                Some(preset) => format!("delete '{}'?", preset.name),
                None => return Err(SessionError::NotFound(id).into()),
            };
            let confirmed = session.role() == Role::Teacher && confirm(input, &question).await?;
            if session.delete_preset(&id, |_| confirmed)? {
                println!("deleted {id}");
            } else {
                println!("kept");
            }
        }
        PracticeCommand::Role(role) => {
            session.switch_role(role).await;
            println!("{} mode", role_label(role));
        }
        PracticeCommand::Day => {
            let day = session.toggle_day_mode();
            println!("{} mode", if day { "day" } else { "night" });
        }
        PracticeCommand::Open(link) => {
            let Some(id) = colregs_lights::session::deep_link_id(&link) else {
                println!("no preset id in link");
                return Ok(());
            };
            match session.open_deep_link(&id).await? {
                Some(preset) => println!("{}", practice::render_preset(preset)),
                None => println!("shared preset not found"),
            }
        }
        PracticeCommand::Show => {
            println!("{}", practice::render_grid(session.grid()));
            println!("colour: {}  lights: {}", session.selected_color(), session.grid().active_count());
            if let Some(preset) = session.selected_preset() {
                println!("selected: {} ({})", preset.name, if session.is_revealed() { "revealed" } else { "hidden" });
            }
            if let SaveFlow::Shared { link } = session.save_flow() {
                println!("last share link: {link}");
            }
        }
        PracticeCommand::Help => println!("{}", practice::HELP),
        PracticeCommand::Quit => {}
    }
    Ok(())
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::Teacher => "teacher",
        Role::Student => "student",
    }
}
