//! mdapi CLI - browse and manage a MangaDex account from the terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mdapi::config::Config;
use mdapi::console::Console;
use mdapi::schema::MangaSearch;
use mdapi::{Client, SessionState};
use std::io::{self, BufRead, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable read for the password before prompting.
const PASSWORD_ENV: &str = "MDAPI_PASSWORD";

/// Command-line client for the MangaDex API.
#[derive(Parser, Debug)]
#[command(name = "mdapi")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log every request made to the service.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and save the session.
    Login {
        username: String,
    },

    /// End the session and forget saved credentials.
    Logout,

    /// Show the logged-in user.
    Whoami,

    /// Search manga by title.
    Search {
        title: String,

        /// Results per page (1-500).
        #[arg(long)]
        limit: Option<usize>,

        /// Number of pages to fetch.
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,
    },

    /// Show details for one manga.
    Manga {
        id: String,
    },

    /// List a manga's chapters.
    Feed {
        id: String,

        /// Only chapters translated into these languages.
        #[arg(long = "lang")]
        languages: Vec<String>,
    },

    /// List every tag.
    Tags,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let console = Console::new();
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let mut client = Client::new(config).context("Failed to create client")?;

    match args.command {
        Command::Login { username } => {
            let password = read_password(&username)?;
            client
                .auth()
                .login(&username, &password)
                .context("Login failed")?;
            console.success(&format!("Logged in as {username}"));
        }
        Command::Logout => {
            if client.session().check_liveness() == SessionState::Anonymous {
                console.info("Not logged in");
                return Ok(());
            }
            if let Err(err) = client.auth().logout() {
                console.warning(&format!("Service logout failed: {err}"));
            }
            console.success("Logged out");
        }
        Command::Whoami => {
            if client.session().check_liveness() == SessionState::Anonymous {
                console.info("Not logged in");
                return Ok(());
            }
            let me = client.user().me().context("Failed to fetch current user")?;
            println!("{}", console.user_line(&me));
        }
        Command::Search {
            title,
            limit,
            pages,
        } => {
            let mut cursor = client.manga().search(&MangaSearch::title(title))?;
            if let Some(limit) = limit {
                cursor = cursor.page_size(limit)?;
            }

            let mut shown = 0;
            for _ in 0..pages {
                let page = cursor.next_page().context("Search failed")?;
                for manga in &page {
                    println!("{}", console.manga_line(manga));
                }
                shown += page.len();
                if cursor.is_exhausted() {
                    break;
                }
            }
            console.info(&console.count_summary(shown, cursor.total()));
        }
        Command::Manga { id } => {
            let manga = client.manga().get(id.as_str()).context("Failed to fetch manga")?;
            println!("{}", console.manga_details(&manga));
        }
        Command::Feed { id, languages } => {
            let languages: Vec<&str> = languages.iter().map(String::as_str).collect();
            let mut shown = 0;
            for chapter in client.manga().feed(id.as_str(), &languages)? {
                let chapter = chapter.context("Failed to fetch chapters")?;
                println!("{}", console.chapter_line(&chapter));
                shown += 1;
            }
            console.info(&console.count_summary(shown, None));
        }
        Command::Tags => {
            let mut tags = client.manga().all_tags().context("Failed to fetch tags")?;
            tags.sort_by(|a, b| a.name.preferred().cmp(&b.name.preferred()));
            for tag in &tags {
                println!("{}", console.tag_line(tag));
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "mdapi=debug" } else { "mdapi=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Reads the password from the environment, or from one line of stdin.
fn read_password(username: &str) -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }

    eprint!("Password for {username}: ");
    io::stderr().flush().context("Failed to write prompt")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
