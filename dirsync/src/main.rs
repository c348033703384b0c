use anyhow::Result;
use clap::Parser;
use tracing::instrument;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "dirsync",
    version,
    about = "Mirror a source directory tree into a destination directory",
    long_about = "`dirsync` makes a destination directory mirror a source directory.

Missing directories are created and new or changed files are copied. A file counts as
unchanged when its size and modification time match the source. With --delete-missing,
destination entries that no longer exist in the source are removed as well.

Every processed entry produces one line of output, errors included. A failing entry never
stops the run.

EXAMPLES:
    # Copy new and changed files
    dirsync /data/src /backup/src

    # Mirror exactly, removing what is gone from the source
    dirsync --delete-missing /data/src /backup/src

    # Write the outcome lines to a file
    dirsync /data/src /backup/src --log sync.log"
)]
struct Args {
    // Sync options
    /// Remove destination entries that do not exist in the source
    #[arg(short = 'd', long = "delete-missing", help_heading = "Sync options")]
    delete_missing: bool,

    /// Maximum number of files copied concurrently, 0 means no limit
    #[arg(
        long,
        default_value = "5",
        value_name = "N",
        help_heading = "Sync options"
    )]
    max_concurrent_files: usize,

    /// Attributes compared when deciding whether a destination file is up to date
    ///
    /// Comma separated list of: size, mtime
    #[arg(
        long,
        default_value = "size,mtime",
        value_name = "ATTRS",
        help_heading = "Sync options"
    )]
    metadata_compare: String,

    // Progress & output
    /// File to store outcome lines (instead of stdout)
    #[arg(long, value_name = "PATH", help_heading = "Progress & output")]
    log: Option<std::path::PathBuf>,

    /// Verbose level: -v INFO / -vv DEBUG / -vvv TRACE (default: ERROR)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Progress & output")]
    verbose: u8,

    /// Quiet mode, suppress stdout output and error logging
    ///
    /// When used with --log, outcome lines are still written to the log file.
    #[arg(short = 'q', long = "quiet", help_heading = "Progress & output")]
    quiet: bool,

    // Performance & throttling
    /// Throttle the number of directory entries processed per second, 0 means no throttle
    #[arg(
        long,
        default_value = "0",
        value_name = "N",
        help_heading = "Performance & throttling"
    )]
    ops_throttle: usize,

    // Advanced settings
    /// Number of worker threads, 0 means number of cores
    #[arg(
        long,
        default_value = "0",
        value_name = "N",
        help_heading = "Advanced settings"
    )]
    max_workers: usize,

    /// Number of blocking worker threads, 0 means Tokio runtime default (512)
    #[arg(
        long,
        default_value = "0",
        value_name = "N",
        help_heading = "Advanced settings"
    )]
    max_blocking_threads: usize,

    // ARGUMENTS
    /// Source directory
    #[arg()]
    src: std::path::PathBuf,

    /// Destination directory
    #[arg()]
    dst: std::path::PathBuf,
}

#[instrument]
async fn async_main(args: Args) -> Result<()> {
    let compare = common::filecmp::parse_compare_settings(&args.metadata_compare)?;
    // output to stdout if no log file and not quiet
    let use_stdout = args.log.is_none() && !args.quiet;
    let log = common::OutcomeLog::new(args.log.as_deref(), use_stdout).await?;
    let dir_sync = common::DirSync::new(
        args.delete_missing,
        std::sync::Arc::new(common::LocalFileOps::new(compare)),
        &common::copy::Settings {
            max_concurrent_files: args.max_concurrent_files,
        },
        log.clone(),
    );
    dir_sync.sync(&args.src, &args.dst).await;
    log.write_line("synchronization completed").await?;
    log.flush().await?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    for (role, path) in [("source", &args.src), ("destination", &args.dst)] {
        if let Err(error) = common::path::validate_directory(path) {
            eprintln!("invalid {role} directory: {:#}", anyhow::Error::from(error));
            std::process::exit(1);
        }
    }
    let func = {
        let args = args.clone();
        || async_main(args)
    };
    let output = common::OutputConfig {
        quiet: args.quiet,
        verbose: args.verbose,
    };
    let runtime = common::RuntimeConfig {
        max_workers: args.max_workers,
        max_blocking_threads: args.max_blocking_threads,
    };
    let throttle = common::ThrottleConfig {
        ops_throttle: args.ops_throttle,
    };
    let res = common::run(output, runtime, throttle, func);
    if res.is_none() {
        std::process::exit(1);
    }
    Ok(())
}
