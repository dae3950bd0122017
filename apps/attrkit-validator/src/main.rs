#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! attrkit-validator: prepare a request body against a schema document.
//!
//! Prints the prepared body as JSON on success. Exit code 2 means the
//! request was rejected; exit code 1 means the inputs or configuration are
//! unusable.

mod config;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use attrkit::Action;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use runner::{BodySource, Outcome, Request};

#[derive(Parser, Debug)]
#[command(name = "attrkit-validator", version, about, long_about = None)]
struct Cli {
    /// Schema document (YAML, or JSON with a `.json` extension).
    #[arg(long)]
    schema: PathBuf,

    /// Resource or sub-resource name within the schema document.
    #[arg(long)]
    resource: String,

    /// Request body file, or `-` for stdin.
    #[arg(long)]
    body: String,

    /// Prepare an update instead of a creation.
    #[arg(long)]
    update: bool,

    /// Project the caller authenticated against.
    #[arg(long)]
    project_id: Option<String>,

    /// Caller has admin privileges.
    #[arg(long)]
    admin: bool,

    /// Caller role (repeatable).
    #[arg(long = "role")]
    roles: Vec<String>,

    /// Engine configuration file (YAML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn request(&self) -> Request {
        Request {
            schema: self.schema.clone(),
            resource: self.resource.clone(),
            body: BodySource::from(self.body.as_str()),
            action: if self.update {
                Action::Update
            } else {
                Action::Create
            },
            project_id: self.project_id.clone(),
            admin: self.admin,
            roles: self.roles.clone(),
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = match config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };

    match runner::run(&cli.request(), &config) {
        Ok(Outcome::Prepared(body)) => match serde_json::to_string_pretty(&body) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("failed to render prepared body: {e}");
                ExitCode::from(1)
            }
        },
        Ok(Outcome::Rejected(err)) => {
            tracing::debug!(status = err.status_code(), "request rejected");
            eprintln!("{err}");
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
