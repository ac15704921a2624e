//! # CLI Layer
//!
//! This module is **one possible client** of coursesync: the library does the
//! work, the CLI only wires it to a terminal.
//!
//! The CLI layer is the **only** place in the codebase that:
//! - Knows about stdin, stdout and stderr
//! - Installs the logging subscriber
//! - Resolves the data directory and loads configuration
//!
//! ## Output Streams
//!
//! `call` and `serve` write JSON replies to stdout, one per line. Logs always go
//! to stderr so stdout stays a clean transport.
//!
//! ## Structure
//!
//! - `run()`: Main dispatch logic (called by `main.rs`)
//! - `init_context()`: Builds `AppContext` with API and configuration
//! - `handle_*()`: Per-command handlers that call the API and print

use super::print::{
    print_course_created, print_functions, print_outline, print_report, print_staged,
};
use super::setup::{Cli, Commands, CourseCommands, DraftCommands};
use clap::Parser;
use coursesync::api::SyncApi;
use coursesync::auth::{GrantTable, Principal};
use coursesync::config::{SyncConfig, CONFIG_FILENAME};
use coursesync::content::fs::FsContentStore;
use coursesync::error::{Result, SyncError};
use coursesync::model::{CourseId, DraftId};
use coursesync::rpc::{self, Params, RpcReply, FUNCTIONS};
use coursesync::store::fs_backend::FsBackend;
use coursesync::store::CourseStore;
use directories::ProjectDirs;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type FsApi = SyncApi<CourseStore<FsBackend>, FsContentStore, GrantTable>;

struct AppContext {
    api: FsApi,
    data_dir: PathBuf,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let (config, data_dir) = load_config(&cli)?;
    init_logging(&config, cli.verbose);
    debug!(data_dir = %data_dir.display(), "configuration loaded");

    if let Commands::Functions = cli.command {
        print_functions(FUNCTIONS);
        return Ok(());
    }

    let ctx = init_context(&config, data_dir);

    match cli.command {
        Commands::Course(CourseCommands::Create { name }) => {
            handle_course_create(&ctx, &name.join(" "))
        }
        Commands::Course(CourseCommands::Show { id }) => handle_course_show(&ctx, &id),
        Commands::Draft(DraftCommands::Add { draft, files }) => {
            handle_draft_add(&ctx, &draft, &files)
        }
        Commands::Call {
            function,
            params,
            principal,
        } => handle_call(&ctx, &function, &params, &principal),
        Commands::Serve { principal } => handle_serve(&ctx, principal),
        Commands::Doctor => handle_doctor(&ctx),
        Commands::Functions => Ok(()),
    }
}

/// Resolve the data directory and load configuration.
///
/// Precedence for the data directory: `--data-dir`, then `data_dir` from the
/// environment or config file, then the OS data directory.
fn load_config(cli: &Cli) -> Result<(SyncConfig, PathBuf)> {
    let provisional = match cli.data_dir.clone() {
        Some(dir) => dir,
        None => match std::env::var_os("COURSESYNC_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        },
    };
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| provisional.join(CONFIG_FILENAME));
    let config = SyncConfig::load(&config_path)?;

    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| config.data_dir.clone())
        .unwrap_or(provisional);
    Ok((config, data_dir))
}

fn default_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("org", "coursesync", "coursesync")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| SyncError::Config("could not determine a data directory".into()))
}

fn init_logging(config: &SyncConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
    };
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn init_context(config: &SyncConfig, data_dir: PathBuf) -> AppContext {
    let store = CourseStore::with_backend(FsBackend::new(data_dir.clone()));
    let content = FsContentStore::new(data_dir.clone());
    let authorizer = GrantTable::new(config.grants());
    AppContext {
        api: SyncApi::new(store, content, authorizer),
        data_dir,
    }
}

fn handle_course_create(ctx: &AppContext, name: &str) -> Result<()> {
    let course = ctx.api.create_course(name)?;
    print_course_created(&course);
    Ok(())
}

fn handle_course_show(ctx: &AppContext, id: &str) -> Result<()> {
    let course: CourseId = id.parse()?;
    let outline = ctx.api.outline(course)?;
    print_outline(&outline);
    Ok(())
}

fn handle_draft_add(ctx: &AppContext, draft: &str, files: &[PathBuf]) -> Result<()> {
    let draft_id: DraftId = draft.parse()?;
    let staged = files
        .iter()
        .map(|file| ctx.api.content().stage_file(draft_id, file))
        .collect::<Result<Vec<_>>>()?;
    info!(draft = %draft_id, files = staged.len(), data_dir = %ctx.data_dir.display(), "files staged");
    print_staged(draft, &staged);
    Ok(())
}

fn handle_call(ctx: &AppContext, function: &str, params: &[String], principal: &str) -> Result<()> {
    let params = Params::from_pairs(params)?;
    let response = rpc::dispatch(&ctx.api, &Principal::new(principal), function, &params)?;
    let line = serde_json::to_string(&RpcReply::Ok(response))?;
    println!("{}", line);
    Ok(())
}

fn handle_serve(ctx: &AppContext, principal: Option<String>) -> Result<()> {
    let fallback = principal.map(Principal::new);
    info!(data_dir = %ctx.data_dir.display(), "serving requests on stdin");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let reply = rpc::handle_line(&ctx.api, &line, fallback.as_ref());
        serde_json::to_writer(&mut out, &reply)?;
        out.write_all(b"\n")?;
        out.flush()?;
    }
    Ok(())
}

fn handle_doctor(ctx: &AppContext) -> Result<()> {
    let report = ctx.api.doctor()?;
    print_report(&report);
    if report.is_clean() {
        Ok(())
    } else {
        Err(SyncError::Store(format!(
            "{} structural problem(s) found",
            report.problems.len()
        )))
    }
}
