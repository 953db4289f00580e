#[macro_use]
extern crate log;

mod browser;
mod config;
mod tracker;

use crate::browser::Browser;
use crate::config::{Config, Target};
use crate::tracker::{GitHub, Http, Kind, Request};

use anyhow::{ensure, Context, Error};
use colored::*;
use env_logger::Env;
use structopt::StructOpt;

type Result<T, E = Error> = std::result::Result<T, E>;

/// Project management through GitHub issues and discussions.
///
/// Manage your work through one of the following objects:
///
/// * TODO - a work item that needs to be done; a GitHub issue which can be closed
///
/// * NOTE - a quick, short note; a GitHub discussion in the "Ideas" category
///
/// * DOC - a deliberate, thought-out document; a GitHub discussion in the "General" category
#[derive(Clone, StructOpt)]
#[structopt(
    rename_all = "kebab",
    after_help = "\
    Settings may also be placed in a .env file in the current directory.
    Set RUST_LOG=ghpm=debug in the environment to get full logging output.
    "
)]
pub struct Opt {
    #[structopt(flatten)]
    config: Config,
    #[structopt(subcommand)]
    command: Cmd,
}

#[derive(Debug, Clone, StructOpt)]
pub enum Cmd {
    /// Creates a TODO (GitHub issue)
    Todo(Common),
    /// Creates a NOTE (GitHub discussion in the note category)
    Note(Common),
    /// Creates a DOC (GitHub discussion in the doc category)
    Doc(Common),
    /// Checks the connection to GitHub and shows settings
    Debug,
    /// Opens the target repository in a browser
    Open,
}

/// Arguments shared by all object-creating subcommands
#[derive(Debug, Clone, StructOpt)]
pub struct Common {
    /// Title of the new object
    #[structopt(value_name = "TITLE")]
    title: String,
    /// Optional body text
    #[structopt(short, long, value_name = "TEXT")]
    body: Option<String>,
    /// Open the created object in a browser (default)
    #[structopt(short = "o", long = "open", name = "open", overrides_with = "no-open")]
    open: bool,
    /// Don't open the created object in a browser
    #[structopt(short = "n", long = "no-open", name = "no-open", overrides_with = "open")]
    no_open: bool,
}

impl Common {
    fn request(&self, kind: Kind) -> Result<Request> {
        ensure!(!self.title.trim().is_empty(), "Title must not be empty");
        Ok(Request {
            kind,
            title: self.title.clone(),
            body: self.body.clone(),
            open: self.open || !self.no_open,
        })
    }
}

fn github(config: &Config, target: Target) -> Result<GitHub<Http>> {
    let http = Http::new(target.token(), config.timeout())?;
    Ok(GitHub::new(http, target, config.api_url()).with_todo_label(config.todo_label.clone()))
}

fn create(config: &Config, common: &Common, kind: Kind) -> Result<()> {
    let req = common.request(kind)?;
    let gh = github(config, config.target()?)?;
    gh.submit(&req, &config.browser())
        .with_context(|| format!("Failed to create {}", req.kind))?;
    Ok(())
}

fn debug(config: &Config) -> Result<()> {
    let target = config.target()?;
    let gh = github(config, target.clone())?;
    gh.ping()
        .with_context(|| format!("Cannot access repository {}", target))?;
    info!("GHPM_REPO_OWNER={}", target.owner.green());
    info!("GHPM_REPO_NAME={}", target.name.green());
    info!("GHPM_DOC_CAT={}", config.doc_category.green());
    info!("GHPM_NOTE_CAT={}", config.note_category.green());
    info!("GHPM_OPEN_URL={}", config.open_url()?.green());
    info!("GHPM_API_URL={}", config.api_url().green());
    if let Some(label) = &config.todo_label {
        info!("GHPM_TODO_LABEL={}", label.green());
    }
    info!("Setup successful!");
    Ok(())
}

fn open(config: &Config) -> Result<()> {
    let url = config.open_url()?;
    info!("Opening {}", url.green());
    config
        .browser()
        .open(&url)
        .with_context(|| format!("Cannot open {}", url))
}

fn run() -> Result<()> {
    dotenv::dotenv().ok();
    let opt = Opt::from_args();
    let config = &opt.config;
    match &opt.command {
        Cmd::Todo(c) => create(config, c, Kind::Issue),
        Cmd::Note(c) => create(
            config,
            c,
            Kind::Discussion {
                category: config.note_category.clone(),
            },
        ),
        Cmd::Doc(c) => create(
            config,
            c,
            Kind::Discussion {
                category: config.doc_category.clone(),
            },
        ),
        Cmd::Debug => debug(config),
        Cmd::Open => open(config),
    }
}

fn init_logging() {
    env_logger::from_env(Env::default().default_filter_or("info")).init();
}

fn main() {
    init_logging();
    if let Err(err) = run() {
        for e in err.chain() {
            error!("{}", e);
            // reqwest seems to fold all causes into its head error
            if e.downcast_ref::<reqwest::Error>().is_some() {
                break;
            }
        }
        std::process::exit(1);
    }
}
