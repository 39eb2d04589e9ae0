use agent_discoveries::config::{self, AppConfig};
use agent_discoveries::db::models::{
    NewAgent, NewLocation, NewLocationStatusReport, NewRegion, NewUser,
};
use agent_discoveries::db::Database;
use agent_discoveries::output::{json as json_out, table};
use agent_discoveries::search::filters::{validate_call_sign, ReportSearchParams};
use agent_discoveries::search::ReportSearchOutput;
use agent_discoveries::Error;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "agent-discoveries", version, about = "Agent Discoveries — agents, locations and status reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to database file (default: ~/.agent-discoveries/agent-discoveries.db)
    #[arg(long, global = true, env = "AGENT_DISCOVERIES_DB")]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Manage agents
    Agent {
        #[command(subcommand)]
        action: AgentCommand,
    },

    /// Manage regions
    Region {
        #[command(subcommand)]
        action: RegionCommand,
    },

    /// Manage locations
    Location {
        #[command(subcommand)]
        action: LocationCommand,
    },

    /// Manage and search location status reports
    Report {
        #[command(subcommand)]
        action: ReportCommand,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Args)]
struct UserFields {
    username: String,

    #[arg(long, default_value = "")]
    full_name: String,
}

impl From<UserFields> for NewUser {
    fn from(f: UserFields) -> Self {
        NewUser {
            username: f.username,
            full_name: f.full_name,
        }
    }
}

#[derive(Subcommand)]
enum UserCommand {
    /// Add a user
    Add(UserFields),

    /// Show a user
    Show { id: i64 },

    /// Update a user
    Update {
        id: i64,

        #[command(flatten)]
        fields: UserFields,
    },

    /// Delete a user, their agent and its reports
    Delete { id: i64 },
}

#[derive(Args)]
struct AgentFields {
    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,

    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    date_of_birth: String,

    #[arg(long, default_value = "0")]
    rank: i64,

    #[arg(long)]
    call_sign: String,

    #[arg(long)]
    user_id: i64,
}

impl AgentFields {
    fn into_new_agent(self) -> Result<NewAgent> {
        validate_call_sign(&self.call_sign)?;
        let date_of_birth = NaiveDate::parse_from_str(&self.date_of_birth, "%Y-%m-%d")
            .with_context(|| format!("Invalid date of birth: {}", self.date_of_birth))?;
        Ok(NewAgent {
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth,
            rank: self.rank,
            call_sign: self.call_sign,
            user_id: self.user_id,
        })
    }
}

#[derive(Subcommand)]
enum AgentCommand {
    /// Add an agent
    Add(AgentFields),

    /// Show an agent by call sign
    Show { call_sign: String },

    /// Update the agent owned by a user
    Update {
        /// User ID owning the agent
        id: i64,

        #[command(flatten)]
        fields: AgentFields,
    },

    /// Delete the agent owned by a user
    Delete { user_id: i64 },

    /// List agents
    List,
}

#[derive(Subcommand)]
enum RegionCommand {
    /// Add a region
    Add {
        name: String,

        #[arg(long, default_value = "")]
        summary: String,
    },

    /// Show a region
    Show { id: i64 },

    /// Delete a region
    Delete { id: i64 },
}

#[derive(Args)]
struct LocationFields {
    #[arg(long)]
    site_name: String,

    #[arg(long, default_value = "")]
    location: String,

    #[arg(long, default_value = "UTC")]
    time_zone: String,

    #[arg(long)]
    region_id: Option<i64>,
}

impl From<LocationFields> for NewLocation {
    fn from(f: LocationFields) -> Self {
        NewLocation {
            site_name: f.site_name,
            location: f.location,
            time_zone: f.time_zone,
            region_id: f.region_id,
        }
    }
}

#[derive(Subcommand)]
enum LocationCommand {
    /// Add a location
    Add(LocationFields),

    /// Show a location
    Show { id: i64 },

    /// Update a location
    Update {
        id: i64,

        #[command(flatten)]
        fields: LocationFields,
    },

    /// Delete a location and its reports
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum ReportCommand {
    /// File a status report
    Add {
        #[arg(long)]
        agent_id: i64,

        #[arg(long)]
        location_id: i64,

        #[arg(long, default_value = "0")]
        status: i64,

        /// Report time (RFC 3339, default: now)
        #[arg(long)]
        time: Option<String>,

        #[arg(long, default_value = "")]
        body: String,
    },

    /// Show a report
    Show { id: i64 },

    /// Delete a report
    Delete { id: i64 },

    /// Search reports; all given filters must match
    Search {
        /// Filing agent's call sign (exact match)
        #[arg(long)]
        call_sign: Option<String>,

        #[arg(long)]
        location_id: Option<String>,

        /// Reports at or after this time (RFC 3339)
        #[arg(long)]
        from: Option<String>,

        /// Reports at or before this time (RFC 3339)
        #[arg(long)]
        to: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write a commented config template if none exists
    Init,

    /// Show the effective configuration
    Show,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let json_output = cli.json;
    let app_config = AppConfig::load()?;

    if let Commands::Config { action } = cli.command {
        return run_config(action, &app_config, cli.db);
    }

    let db_path = app_config.resolve_db_path(cli.db)?;
    let db = Database::open_with_timeout(&db_path, app_config.busy_timeout_ms())?;

    match cli.command {
        Commands::User { action } => run_user(&db, action, json_output)?,
        Commands::Agent { action } => run_agent(&db, action, json_output)?,
        Commands::Region { action } => run_region(&db, action, json_output)?,
        Commands::Location { action } => run_location(&db, action, json_output)?,
        Commands::Report { action } => run_report(&db, action, json_output)?,
        Commands::Config { .. } => unreachable!("handled above"),
    }

    Ok(())
}

fn run_config(action: ConfigCommand, app_config: &AppConfig, db_flag: Option<PathBuf>) -> Result<()> {
    match action {
        ConfigCommand::Init => {
            let path = config::config_path()?;
            if config::init_config()? {
                println!("Wrote {}", path.display());
            } else {
                println!("Config already exists: {}", path.display());
            }
        }
        ConfigCommand::Show => {
            let db_path = app_config.resolve_db_path(db_flag)?;
            println!("[database]");
            println!("path = \"{}\"", db_path.display());
            println!("busy_timeout_ms = {}", app_config.busy_timeout_ms());
        }
    }
    Ok(())
}

fn run_user(db: &Database, action: UserCommand, json_output: bool) -> Result<()> {
    match action {
        UserCommand::Add(fields) => {
            let id = db.add_user(&fields.into())?;
            println!("Added user {id}");
        }
        UserCommand::Show { id } => {
            let user = db
                .get_user(id)?
                .ok_or_else(|| Error::not_found("User", id))?;
            if json_output {
                json_out::print_json(&user)?;
            } else {
                table::print_user_detail(&user);
            }
        }
        UserCommand::Update { id, fields } => {
            if db.update_user(id, &fields.into())? == 0 {
                return Err(Error::not_found("User", id).into());
            }
            println!("Updated user {id}");
        }
        UserCommand::Delete { id } => {
            db.delete_user(id)?;
            println!("Deleted user {id}");
        }
    }
    Ok(())
}

fn run_agent(db: &Database, action: AgentCommand, json_output: bool) -> Result<()> {
    match action {
        AgentCommand::Add(fields) => {
            let agent = fields.into_new_agent()?;
            let id = db.add_agent(&agent)?;
            println!("Added agent {} ({id})", agent.call_sign);
        }
        AgentCommand::Show { call_sign } => {
            let agent = db
                .get_agent(&call_sign)?
                .ok_or_else(|| Error::not_found("Agent", &call_sign))?;
            if json_output {
                json_out::print_json(&agent)?;
            } else {
                table::print_agent_detail(&agent);
            }
        }
        AgentCommand::Update { id, fields } => {
            let agent = fields.into_new_agent()?;
            if agent.user_id != id {
                return Err(Error::invalid_input(
                    "user id",
                    "cannot differ from the id being updated",
                )
                .into());
            }
            if db.update_agent(&agent)? == 0 {
                return Err(Error::not_found("Agent for user", id).into());
            }
            println!("Updated agent {}", agent.call_sign);
        }
        AgentCommand::Delete { user_id } => {
            db.delete_agent_by_user_id(user_id)?;
            println!("Deleted agent for user {user_id}");
        }
        AgentCommand::List => {
            let agents = db.list_agents()?;
            if json_output {
                json_out::print_json(&agents)?;
            } else {
                table::print_agent_list(&agents);
            }
        }
    }
    Ok(())
}

fn run_region(db: &Database, action: RegionCommand, json_output: bool) -> Result<()> {
    match action {
        RegionCommand::Add { name, summary } => {
            let id = db.add_region(&NewRegion { name, summary })?;
            println!("Added region {id}");
        }
        RegionCommand::Show { id } => {
            let region = db
                .get_region(id)?
                .ok_or_else(|| Error::not_found("Region", id))?;
            if json_output {
                json_out::print_json(&region)?;
            } else {
                table::print_region_detail(&region);
            }
        }
        RegionCommand::Delete { id } => {
            db.delete_region(id)?;
            println!("Deleted region {id}");
        }
    }
    Ok(())
}

fn run_location(db: &Database, action: LocationCommand, json_output: bool) -> Result<()> {
    match action {
        LocationCommand::Add(fields) => {
            let id = db.add_location(&fields.into())?;
            println!("Added location {id}");
        }
        LocationCommand::Show { id } => {
            let location = db
                .get_location(id)?
                .ok_or_else(|| Error::not_found("Location", id))?;
            if json_output {
                json_out::print_json(&location)?;
            } else {
                table::print_location_detail(&location);
            }
        }
        LocationCommand::Update { id, fields } => {
            if db.update_location(id, &fields.into())? == 0 {
                return Err(Error::not_found("Location", id).into());
            }
            println!("Updated location {id}");
        }
        LocationCommand::Delete { id } => {
            db.delete_location(id)?;
            println!("Deleted location {id}");
        }
    }
    Ok(())
}

fn run_report(db: &Database, action: ReportCommand, json_output: bool) -> Result<()> {
    match action {
        ReportCommand::Add {
            agent_id,
            location_id,
            status,
            time,
            body,
        } => {
            let report_time = time.unwrap_or_else(|| {
                chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
            });
            let id = db.add_report(&NewLocationStatusReport {
                agent_id,
                location_id,
                status,
                report_time,
                report_body: body,
            })?;
            println!("Added report {id}");
        }
        ReportCommand::Show { id } => {
            let report = db
                .get_report(id)?
                .ok_or_else(|| Error::not_found("Report", id))?;
            if json_output {
                json_out::print_json(&report)?;
            } else {
                table::print_report_detail(&report);
            }
        }
        ReportCommand::Delete { id } => {
            db.delete_report(id)?;
            println!("Deleted report {id}");
        }
        ReportCommand::Search {
            call_sign,
            location_id,
            from,
            to,
        } => {
            let params = ReportSearchParams {
                call_sign,
                location_id,
                from_time: from,
                to_time: to,
            };
            let criteria = params.to_criteria()?;
            let reports = db.search_reports_by(&criteria)?;
            if json_output {
                json_out::print_json(&ReportSearchOutput {
                    total: reports.len(),
                    reports,
                })?;
            } else {
                table::print_report_results(&reports);
            }
        }
    }
    Ok(())
}
