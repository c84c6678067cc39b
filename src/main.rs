//! Fitdash CLI
//!
//! Terminal client for the fitness dashboard:
//! - Sign in and out
//! - Open any dashboard screen by path
//! - Trigger a sync and wait for fresh data
//! - Chat with the insights assistant

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use fitdash::config::generate_default_config;
use fitdash::render::{
    render, render_assistant_overview, render_transcript, render_transcript_since, OutputFormat,
};
use fitdash::{logging, App, Config, LocalStore, Role, Screen, SyncOutcome};

#[derive(Parser)]
#[command(name = "fitdash")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Terminal client for the fitness dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: platform config dir, then ./fitdash.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL, e.g. http://localhost:8000/api/v1
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and open the dashboard
    Login {
        username: String,
        /// Password (prompted on stdin when absent)
        #[arg(long, env = "FITDASH_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out and forget the saved credential
    Logout,

    /// Open a screen, e.g. `/dashboard`, `/activities/run?range=week`, `/insights/vdot`
    Open {
        /// Location to open (default: /dashboard)
        path: Option<String>,
        /// Extra activity pages to load
        #[arg(long, default_value_t = 0)]
        more: usize,
    },

    /// Trigger a sync and wait for fresh data
    Sync {
        /// Ask the server for a full refresh
        #[arg(long)]
        force: bool,
    },

    /// Ask the insights assistant
    Ask {
        question: Vec<String>,
        /// Show the assistant's daily summary first
        #[arg(long)]
        overview: bool,
    },

    /// Interactive assistant conversation about a screen
    ///
    /// Lines are questions unless they start with a command:
    /// `/overview`, `/follow N`, `/up`, `/down`, `/new`, `/open PATH`,
    /// `/insight ID`, `/performance ID`, `/back`, `/quit`.
    Chat {
        /// Screen the conversation is about (default: /dashboard)
        path: Option<String>,
    },

    /// Start a new assistant conversation
    NewChat,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    Ok(config)
}

fn read_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn prompt() -> anyhow::Result<Option<String>> {
    eprint!("> ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn latest_answer(app: &App) -> Option<usize> {
    app.assistant()
        .transcript()
        .iter()
        .rposition(|m| m.role == Role::Assistant)
}

async fn chat(app: &mut App, format: OutputFormat) -> anyhow::Result<()> {
    while let Some(line) = prompt()? {
        let (command, arg) = match line.split_once(' ') {
            Some((command, arg)) => (command, arg.trim()),
            None => (line.as_str(), ""),
        };
        let seen = app.assistant().transcript().len();

        let answered = match command {
            "" => continue,
            "/quit" | "/exit" => break,
            "/overview" => {
                app.finish_assistant_overview().await;
                match app.assistant_overview() {
                    Some(view) => println!("{}", render_assistant_overview(view)),
                    None => println!("No summary available."),
                }
                continue;
            }
            "/follow" => {
                let Ok(index) = arg.parse::<usize>() else {
                    eprintln!("Usage: /follow N");
                    continue;
                };
                app.select_follow_up(index).await
            }
            "/up" | "/down" => {
                match latest_answer(app) {
                    Some(index) => {
                        app.send_feedback(index, command == "/up").await;
                        println!("Thanks for the feedback.");
                    }
                    None => eprintln!("Nothing to rate yet."),
                }
                continue;
            }
            "/new" => {
                app.new_chat();
                println!("Started a new conversation.");
                continue;
            }
            "/open" | "/insight" | "/performance" | "/back" => {
                match command {
                    "/open" => app.navigate(arg).await,
                    "/insight" => app.select_insight(arg).await,
                    "/performance" => app.select_performance(arg).await,
                    _ => app.go_back().await,
                }
                println!("{}", render(app, format));
                continue;
            }
            _ => app.ask_assistant(&line).await,
        };

        if app.session().auth_required() {
            bail!("Session expired, sign in again");
        }
        print!("{}", render_transcript_since(app.assistant(), seen));
        if let Err(e) = answered {
            tracing::debug!(error = %e, "Assistant request failed");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                println!("Wrote {:?}", path);
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let config = load_config(&cli)?;
    logging::init(&config.logging);
    tracing::debug!(api = %config.api.base_url, "Fitdash v{}", env!("CARGO_PKG_VERSION"));

    let store = LocalStore::open(&config.storage.data_dir)
        .with_context(|| format!("Failed to open local store in {}", config.storage.data_dir))?;
    let mut app = App::new(config, store).await?;

    match cli.command {
        Commands::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => read_password()?,
            };
            if !app.login(&username, &password).await {
                bail!(
                    "{}",
                    app.session()
                        .error()
                        .unwrap_or(fitdash::session::LOGIN_FAILED_MESSAGE)
                );
            }
            println!("{}", render(&app, cli.format));
        }

        Commands::Logout => {
            app.logout().await;
            println!("Signed out.");
        }

        Commands::Open { path, more } => {
            if app.should_sync_on_open() {
                app.spawn_sync(false);
            }
            let wait = app.config().sync.open_wait();
            app.open(path.as_deref().unwrap_or("")).await;
            if app.sync_pending() {
                app.wait_for_sync_within(wait).await;
            }
            if app.screen() == Screen::Activities {
                for _ in 0..more {
                    if !app.activities().page.can_load_more() {
                        break;
                    }
                    app.load_more_activities().await;
                }
            }
            println!("{}", render(&app, cli.format));
        }

        Commands::Sync { force } => {
            app.open("/dashboard").await;
            if app.screen() == Screen::Login {
                println!("{}", render(&app, cli.format));
                bail!("Sign in before syncing");
            }
            eprintln!("Waiting for fresh data…");
            match app.sync(force).await? {
                SyncOutcome::Changed { last_update } => println!("Updated: {}", last_update),
                SyncOutcome::TimedOut => println!("No new data yet."),
                SyncOutcome::Skipped => println!("A sync is already running."),
            }
            println!("{}", render(&app, cli.format));
        }

        Commands::Ask { question, overview } => {
            if overview {
                app.load_assistant_overview().await;
                if let Some(view) = app.assistant_overview() {
                    println!("{}", render_assistant_overview(view));
                }
            }
            let question = question.join(" ");
            let result = app.ask_assistant(&question).await;
            if app.session().auth_required() {
                bail!("Sign in before asking the assistant");
            }
            print!("{}", render_transcript(app.assistant()));
            result?;
        }

        Commands::Chat { path } => {
            app.open(path.as_deref().unwrap_or("")).await;
            if app.session().auth_required() {
                bail!("Sign in before asking the assistant");
            }
            app.start_assistant_overview();
            chat(&mut app, cli.format).await?;
            app.close_assistant_overview();
        }

        Commands::NewChat => {
            app.new_chat();
            println!("Started a new conversation.");
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}
