//! Operator commands for backups, deployments and accounts.

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use smoras_backend::backup::{
    AutoRestoreOutcome, BackupStore, DeploymentGuard, Markers, ProtectOutcome, RestoreReport, RetentionPolicy, StoredBackup,
};
use smoras_backend::config::settings::{get_config, Settings};
use smoras_backend::db::user_queries::{NewUser, UserQueries};
use smoras_backend::models::user::{UpdateUserProfileRequest, UserRole, UserStatus};
use smoras_backend::telemetry::{get_subscriber, init_subscriber};
use smoras_backend::utils::password::hash_password;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "smoras-manage")]
#[command(about = "Backup, deployment and account management for the Smoras backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a backup to the persistent directory
    Backup {
        /// Label included in the file name
        #[arg(long)]
        name: Option<String>,
    },
    /// Write a backup to the deployment directory and publish it as deployment_db.json
    DeploymentBackup {
        #[arg(long)]
        name: Option<String>,
    },
    /// Restore a backup file into the database
    Restore {
        file: PathBuf,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Restore deployment_db.json
    RestoreDeployment {
        #[arg(long)]
        yes: bool,
    },
    /// Check a backup file against the restore thresholds
    Verify { file: PathBuf },
    /// Protect production data ahead of a deployment
    Protect,
    /// Restore the freshest deployment backup unless disabled by marker
    AutoRestore,
    /// Prune old backups in both directories
    Cleanup {
        /// Backups kept per label
        #[arg(long)]
        keep: Option<usize>,
        /// Unlabelled backups kept
        #[arg(long)]
        keep_manual: Option<usize>,
    },
    /// List backups in both directories
    List,
    /// Database counts, markers and backups
    Status,
    /// Mark this instance as production
    MarkProduction,
    /// Create an approved admin account
    CreateAdmin {
        username: String,
        email: String,
        /// Falls back to ADMIN_PASSWORD, then a prompt
        #[arg(long)]
        password: Option<String>,
    },
    /// Change the role or approval status of an account
    SetRole {
        username: String,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match get_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to read the config: {}", e);
            std::process::exit(1);
        }
    };
    let subscriber = get_subscriber("smoras-manage".into(), config.application.log_level.clone(), io::stderr);
    init_subscriber(subscriber);

    if let Err(e) = execute(cli.command, &config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn connect(config: &Settings) -> CliResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(config.database.connection_string().expose_secret())
        .await?;
    Ok(pool)
}

async fn execute(command: Commands, config: &Settings) -> CliResult<()> {
    // Marker and retention commands touch only the file system
    match &command {
        Commands::MarkProduction => {
            let markers = Markers::new(config.backup.deployment_path());
            let path = markers.mark_production(Utc::now())?;
            println!("Marked as production ({})", path.display());
            return Ok(());
        }
        Commands::Cleanup { keep, keep_manual } => {
            let defaults = RetentionPolicy::from(&config.backup);
            let retention = RetentionPolicy {
                keep_per_label: keep.unwrap_or(defaults.keep_per_label),
                keep_manual: keep_manual.unwrap_or(defaults.keep_manual),
            };
            let mut removed = retention.apply(&BackupStore::new(config.backup.persistent_path()))?;
            removed.extend(retention.apply(&BackupStore::new(config.backup.deployment_path()))?);
            println!("Removed {} backups", removed.len());
            for path in removed {
                println!("  {}", path.display());
            }
            return Ok(());
        }
        _ => {}
    }

    let pool = connect(config).await?;
    let guard = DeploymentGuard::new(pool.clone(), &config.backup);

    match command {
        Commands::Backup { name } => {
            let report = guard.create_backup(name.as_deref()).await?;
            print_backup(&report.backup);
            println!("{}", report.verdict.summary());
        }
        Commands::DeploymentBackup { name } => {
            let report = guard.create_deployment_backup(name.as_deref()).await?;
            print_backup(&report.backup);
            println!("{}", report.verdict.summary());
            if !report.verdict.is_valid() {
                println!("Warning: {}", report.verdict.problems.join("; "));
            }
        }
        Commands::Restore { file, yes } => {
            if confirm(&format!("Replace the database with {}?", file.display()), yes)? {
                print_restore(&guard.restore_file(&file).await?);
            }
        }
        Commands::RestoreDeployment { yes } => {
            if confirm("Replace the database with the deployment backup?", yes)? {
                print_restore(&guard.restore_deployment().await?);
            }
        }
        Commands::Verify { file } => {
            let verdict = guard.verify(&file)?;
            println!("{}", verdict.summary());
            if verdict.is_valid() {
                println!("Backup is valid");
            } else {
                return Err(format!("Backup is not valid: {}", verdict.problems.join("; ")).into());
            }
        }
        Commands::Protect => match guard.protect().await? {
            ProtectOutcome::NotProduction => println!("Not a production environment, nothing to protect"),
            ProtectOutcome::EmptyDatabase { last_resort } => {
                println!("Database is empty; last resort copy written");
                print_backup(&last_resort);
            }
            ProtectOutcome::BackupSufficient { last_resort, verdict } => {
                println!("Deployment backup already covers production ({})", verdict.summary());
                print_backup(&last_resort);
            }
            ProtectOutcome::Protected { last_resort, protected_copy, fresh } => {
                println!("Deployment backup replaced with current production data");
                print_backup(&last_resort);
                if let Some(copy) = protected_copy {
                    print_backup(&copy);
                }
                print_backup(&fresh.backup);
            }
        },
        Commands::AutoRestore => match guard.auto_restore().await? {
            AutoRestoreOutcome::Skipped => println!("Restore disabled by marker"),
            AutoRestoreOutcome::NoBackup => println!("No deployment backup found"),
            AutoRestoreOutcome::Restored(report) => print_restore(&report),
        },
        Commands::List => {
            println!("Deployment backups ({}):", guard.deployment_store().dir().display());
            for backup in guard.deployment_store().list()? {
                print_backup(&backup);
            }
            println!("Persistent backups ({}):", guard.persistent_store().dir().display());
            for backup in guard.persistent_store().list()? {
                print_backup(&backup);
            }
        }
        Commands::Status => {
            let status = guard.status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::CreateAdmin { username, email, password } => {
            let password = match password.or_else(|| std::env::var("ADMIN_PASSWORD").ok()) {
                Some(password) => password,
                None => prompt("Password: ")?,
            };
            if password.len() < 8 {
                return Err("Password must be at least 8 characters".into());
            }
            let users = UserQueries::new(pool);
            if users.find_by_username(&username).await?.is_some() {
                return Err(format!("User {} already exists", username).into());
            }
            let password_hash = hash_password(&password)?;
            let user_id = users
                .create_with_profile(&NewUser {
                    username: &username,
                    email: &email,
                    password_hash: &password_hash,
                    first_name: "",
                    last_name: "",
                    role: UserRole::Admin,
                    status: UserStatus::Approved,
                })
                .await?;
            println!("Created admin {} ({})", username, user_id);
        }
        Commands::SetRole { username, role, status } => {
            let update = UpdateUserProfileRequest {
                role: role.as_deref().map(str::parse::<UserRole>).transpose()?,
                status: status.as_deref().map(str::parse::<UserStatus>).transpose()?,
                player_id: None,
            };
            let users = UserQueries::new(pool);
            let user_id = users
                .find_by_username(&username)
                .await?
                .ok_or_else(|| format!("User {} not found", username))?;
            users.update_profile(user_id, &update).await?;
            if let Some(user) = users.find(user_id).await? {
                println!("{} is now {} ({})", user.username, user.role, user.status);
            }
        }
        Commands::MarkProduction | Commands::Cleanup { .. } => {}
    }
    Ok(())
}

fn print_backup(backup: &StoredBackup) {
    println!("  {} ({} bytes)", backup.name, backup.size);
}

fn print_restore(report: &RestoreReport) {
    println!("Restored {} records from {}", report.summary.total, report.source.display());
    if let Some(safety) = &report.safety_backup {
        println!("Previous data saved as {}", safety.name);
    }
}

fn prompt(message: &str) -> io::Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn confirm(question: &str, assume_yes: bool) -> io::Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    let answer = prompt(&format!("{} [y/N] ", question))?;
    let accepted = matches!(answer.to_lowercase().as_str(), "y" | "yes");
    if !accepted {
        println!("Aborted");
    }
    Ok(accepted)
}
