//! blobport — migrate Rocket.Chat upload blobs out of GridFS.
//!
//! Three phases, run in order by an operator: `dump` copies blobs to the
//! target storage and writes the migration log, `updatedb` rewrites the
//! upload records to point at the new location, and `removeblobs` deletes
//! the originals from GridFS. The phases communicate only through the
//! migration log file, so each can be rerun independently. Nothing stops an
//! operator from running `removeblobs` before `updatedb` — that ordering is
//! destructive and is on the operator to avoid.

use std::path::{Path, PathBuf};

use anyhow::Context;
use blobport_cli::progress;
use blobport_core::{constants, MongoConfig, StorageTarget};
use blobport_db::{connect, BlobRepository, SettingsRepository, UploadRepository};
use blobport_migrate::{MigrationLog, Migrator};
use blobport_storage::create_sink;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Phase {
    /// Copy blobs from GridFS to the storage target and write the log
    Dump,
    /// Rewrite upload records to point at the migrated blobs
    Updatedb,
    /// Delete the original blobs from GridFS
    Removeblobs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    #[value(name = "AmazonS3")]
    AmazonS3,
    #[value(name = "FileSystem")]
    FileSystem,
}

impl From<Target> for StorageTarget {
    fn from(target: Target) -> Self {
        match target {
            Target::AmazonS3 => StorageTarget::AmazonS3,
            Target::FileSystem => StorageTarget::FileSystem,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "blobport",
    about = "Migrate Rocket.Chat files from GridFS to FileSystem or Amazon S3"
)]
struct Cli {
    /// Phase to execute
    #[arg(short = 'c', long = "command", value_enum)]
    command: Phase,

    /// MongoDB host
    #[arg(short = 's', long, default_value = "localhost")]
    host: String,

    /// MongoDB port
    #[arg(short = 'p', long, default_value_t = 27017)]
    port: u16,

    /// Database name
    #[arg(short = 'r', long, default_value = "rocketchat")]
    database: String,

    /// Storage target
    #[arg(short = 't', long, value_enum, default_value = "FileSystem")]
    target: Target,

    /// S3 bucket name or output directory (required for dump)
    #[arg(short = 'd', long)]
    destination: Option<String>,

    /// Migration log file path (defaults to blobport_<timestamp>.csv)
    #[arg(short = 'l', long = "log-file")]
    log_file: Option<PathBuf>,

    /// MongoDB username
    #[arg(long)]
    user: Option<String>,

    /// MongoDB password
    #[arg(long)]
    password: Option<String>,

    /// Number of parallel workers
    #[arg(long, default_value_t = 4)]
    max_workers: usize,
}

/// Argument checks that clap's declarative rules cannot express. Exits with
/// a usage error before any database or storage I/O.
fn validate(cli: &Cli) {
    if cli.command != Phase::Dump {
        return;
    }
    match cli.destination.as_deref() {
        None => Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "the --destination argument is required for the dump command",
            )
            .exit(),
        Some(dest) if cli.target == Target::FileSystem && !Path::new(dest).is_dir() => {
            Cli::command()
                .error(
                    ErrorKind::InvalidValue,
                    format!("destination directory does not exist: {dest}"),
                )
                .exit()
        }
        Some(_) => {}
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    validate(&cli);

    let started = chrono::Local::now();
    let diagnostics_path = format!("blobport_{}.log", started.format("%Y%m%d-%H%M%S"));
    let _guard = blobport_cli::init_tracing(Path::new(&diagnostics_path))
        .context("failed to initialize logging")?;

    let log_path = cli.log_file.clone().unwrap_or_else(|| {
        PathBuf::from(format!("blobport_{}.csv", started.format("%Y%m%d_%H%M%S")))
    });

    let config = MongoConfig {
        host: cli.host.clone(),
        port: cli.port,
        database: cli.database.clone(),
        username: cli.user.clone(),
        password: cli.password.clone(),
    };
    tracing::info!(
        host = %config.host,
        port = config.port,
        database = %config.database,
        migration_log = %log_path.display(),
        max_workers = cli.max_workers,
        "blobport starting"
    );

    let db = connect(&config)
        .await
        .context("failed to connect to MongoDB")?;
    let mut migrator = Migrator::new(
        UploadRepository::new(db.clone()),
        BlobRepository::new(db.clone()),
        MigrationLog::new(&log_path),
        cli.max_workers,
    );

    match cli.command {
        Phase::Dump => {
            let destination = cli
                .destination
                .as_deref()
                .context("destination is required for dump")?;
            let target = StorageTarget::from(cli.target);
            let unique_id = match target {
                StorageTarget::AmazonS3 => Some(
                    SettingsRepository::new(db.clone())
                        .unique_id()
                        .await
                        .context("failed to read the uniqueID setting")?,
                ),
                StorageTarget::FileSystem => None,
            };
            let sink = create_sink(target, destination, unique_id)
                .await
                .context("failed to initialize the storage sink")?;
            migrator
                .dump(
                    constants::UPLOADS_COLLECTION,
                    sink,
                    progress::phase_progress("Dumping files"),
                )
                .await?;
        }
        Phase::Updatedb => {
            migrator
                .update_db(
                    StorageTarget::from(cli.target),
                    progress::phase_progress("Updating records"),
                )
                .await?;
        }
        Phase::Removeblobs => {
            migrator
                .remove_blobs(progress::phase_progress("Removing blobs"))
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_dump_invocation() {
        let cli = Cli::try_parse_from(["blobport", "-c", "dump", "-d", "/tmp/out"]).unwrap();
        assert_eq!(cli.command, Phase::Dump);
        assert_eq!(cli.destination.as_deref(), Some("/tmp/out"));
        assert_eq!(cli.host, "localhost");
        assert_eq!(cli.port, 27017);
        assert_eq!(cli.database, "rocketchat");
        assert_eq!(cli.target, Target::FileSystem);
        assert_eq!(cli.max_workers, 4);
    }

    #[test]
    fn parses_long_flags_and_s3_target() {
        let cli = Cli::try_parse_from([
            "blobport",
            "--command",
            "updatedb",
            "--target",
            "AmazonS3",
            "--user",
            "admin",
            "--password",
            "secret",
            "--max-workers",
            "8",
        ])
        .unwrap();
        assert_eq!(cli.command, Phase::Updatedb);
        assert_eq!(cli.target, Target::AmazonS3);
        assert_eq!(cli.user.as_deref(), Some("admin"));
        assert_eq!(cli.max_workers, 8);
    }

    #[test]
    fn command_is_required() {
        assert!(Cli::try_parse_from(["blobport"]).is_err());
    }

    #[test]
    fn rejects_unknown_phase() {
        assert!(Cli::try_parse_from(["blobport", "-c", "explode"]).is_err());
    }

    #[test]
    fn short_flags_match_the_documented_surface() {
        let cli = Cli::try_parse_from([
            "blobport", "-c", "removeblobs", "-s", "db.example", "-p", "27018", "-r", "chat",
            "-l", "run.csv",
        ])
        .unwrap();
        assert_eq!(cli.command, Phase::Removeblobs);
        assert_eq!(cli.host, "db.example");
        assert_eq!(cli.port, 27018);
        assert_eq!(cli.database, "chat");
        assert_eq!(cli.log_file.as_deref(), Some(Path::new("run.csv")));
    }
}
