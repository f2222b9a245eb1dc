//! `leadflow` command-line entry point.
//!
//! # Responsibility
//! - Operate the lifecycle engine against a SQLite file.
//! - Expose every JSON operation through `invoke` for scripting and webhooks.
//!
//! # Invariants
//! - Command output is JSON on stdout; diagnostics go to the log files.
//! - A failed operation exits non-zero.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use leadflow_core::api::{event_view, OPERATIONS};
use leadflow_core::db::open_db;
use leadflow_core::{
    default_log_level, init_logging_with, Lead, LeadApi, LeadListQuery, LeadService,
    LeadStatus, LifecycleConfig, LifecycleEnv, LogSettings, SaveOptions, SqliteLeadRepository,
    Team,
};
use serde_json::{json, Value};
use std::io::Read;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "leadflow")]
#[command(version, about = "Lead lifecycle engine")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, default_value = "leadflow.sqlite3")]
    db: PathBuf,

    /// JSON lifecycle config (time zone, attempt ceiling, labels)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for rolling log files; logging is off when omitted
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Do not notify observers after saves
    #[arg(long, global = true)]
    skip_hooks: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a team
    CreateTeam {
        name: String,
        /// Call attempts before an unanswered lead leaves the call loop
        #[arg(long)]
        max_call_attempts: Option<u32>,
    },
    /// Create a lead in status `new`
    CreateLead {
        first_name: String,
        #[arg(default_value = "")]
        last_name: String,
        #[arg(long)]
        external_ref: Option<String>,
        /// Team name; links the team and assigns the lead
        #[arg(long)]
        team: Option<String>,
    },
    /// Show a lead with its event history
    Show {
        /// Lead id, or external reference with `--external-ref`
        reference: String,
        #[arg(long)]
        external_ref: bool,
    },
    /// List leads
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        team: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Run a JSON operation, e.g. `invoke logCall '{"id":"…","outcome":"no_answer"}'`
    Invoke {
        operation: String,
        /// JSON payload, `@path` to read a file, or `-` for stdin
        payload: String,
    },
    /// List operation names accepted by `invoke`
    Operations,
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    if let Some(log_dir) = &cli.log_dir {
        let log_dir = std::path::absolute(log_dir)
            .with_context(|| format!("invalid log directory {}", log_dir.display()))?;
        let settings = LogSettings {
            level: cli
                .log_level
                .clone()
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir: log_dir.to_string_lossy().into_owned(),
            mirror_to_stderr: true,
        };
        init_logging_with(&settings).map_err(anyhow::Error::msg)?;
    }

    let config = match &cli.config {
        Some(path) => LifecycleConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => LifecycleConfig::default(),
    };
    let env = LifecycleEnv::new(config);
    let save_options = SaveOptions {
        skip_hooks: cli.skip_hooks,
    };
    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database {}", cli.db.display()))?;
    let service = LeadService::new(SqliteLeadRepository::try_new(&conn)?, env.clone())
        .with_save_options(save_options);

    let output = match cli.command {
        Commands::CreateTeam {
            name,
            max_call_attempts,
        } => {
            let mut team = Team::new(name);
            team.max_call_attempts = max_call_attempts;
            json!({ "success": true, "team": service.create_team(&team)? })
        }
        Commands::CreateLead {
            first_name,
            last_name,
            external_ref,
            team,
        } => {
            let mut lead = Lead::new(first_name, last_name);
            lead.external_ref = external_ref;
            let mut created = service.create_lead(&lead)?;
            if let Some(name) = team {
                let team = service
                    .find_team_by_name(&name)?
                    .with_context(|| format!("team `{name}` does not exist"))?;
                created = service.assign_team(created.id, Some(team.id))?;
            }
            json!({ "success": true, "lead": created })
        }
        Commands::Show {
            reference,
            external_ref,
        } => {
            let lead = if external_ref {
                service
                    .find_by_external_ref(&reference)?
                    .with_context(|| format!("no lead with external reference `{reference}`"))?
            } else {
                let id = Uuid::parse_str(reference.trim())
                    .with_context(|| format!("`{reference}` is not a lead id"))?;
                service.get_lead(id)?
            };
            let events: Vec<Value> = service
                .list_events(lead.id)?
                .iter()
                .map(event_view)
                .collect();
            json!({ "success": true, "lead": lead, "events": events })
        }
        Commands::List {
            status,
            team,
            limit,
        } => {
            let status = match status {
                Some(raw) => match LeadStatus::parse(&raw) {
                    Some(status) => Some(status),
                    None => bail!("unknown status `{raw}`"),
                },
                None => None,
            };
            let team_id = match team {
                Some(name) => Some(
                    service
                        .find_team_by_name(&name)?
                        .with_context(|| format!("team `{name}` does not exist"))?
                        .id,
                ),
                None => None,
            };
            let query = LeadListQuery {
                status,
                team_id,
                limit,
                offset: 0,
            };
            json!({ "success": true, "leads": service.list_leads(&query)? })
        }
        Commands::Invoke { operation, payload } => {
            let payload = read_payload(&payload)?;
            let api = LeadApi::new(&conn, env)?.with_save_options(save_options);
            api.dispatch(&operation, &payload)
        }
        Commands::Operations => json!({ "success": true, "operations": OPERATIONS }),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    let succeeded = output.get("success").and_then(Value::as_bool) == Some(true);
    Ok(if succeeded { 0 } else { 2 })
}

fn read_payload(raw: &str) -> Result<Value> {
    let text = if raw == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read payload from stdin")?;
        buffer
    } else if let Some(path) = raw.strip_prefix('@') {
        std::fs::read_to_string(path).with_context(|| format!("failed to read payload {path}"))?
    } else {
        raw.to_string()
    };
    serde_json::from_str(&text).context("payload is not valid JSON")
}
