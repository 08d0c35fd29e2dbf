use crate::export::ExportFormat;
use clap::{Parser, Subcommand};

/// Command-line interface definition for pomodash
/// Pomodoro work/break timer that survives restarts, backed by SQLite
#[derive(Parser, Debug)]
#[command(
    name = "pomodash",
    version = env!("CARGO_PKG_VERSION"),
    about = "A Pomodoro timer CLI: work/break cycles that survive restarts, logged to SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Act as this user (overrides POMODASH_USER and the config file)
    #[arg(global = true, long = "user")]
    pub user: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration file")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Add missing configuration fields with defaults")]
        migrate: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print or manage the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Remember a user in the configuration file
    Login {
        /// User identifier
        user: String,
    },

    /// Forget the user stored in the configuration file
    Logout {
        #[arg(long = "discard-timer", help = "Also drop the user's running timer")]
        discard_timer: bool,
    },

    /// Start a work phase
    Start {
        #[arg(long, short = 'w', value_name = "MINUTES", help = "Work minutes (default from config)")]
        work: Option<i64>,

        #[arg(
            long = "break",
            short = 'b',
            value_name = "MINUTES",
            help = "Break minutes (default from config)"
        )]
        break_minutes: Option<i64>,

        #[arg(long, help = "Stay in the foreground and show the countdown")]
        watch: bool,
    },

    /// Show the current phase and remaining time
    Status,

    /// Stop the timer and log the elapsed part of the phase
    Stop,

    /// End the work phase now and start the break
    Skip,

    /// Follow the running timer (p=pause r=resume k=skip s=stop q=quit)
    Watch,

    /// Drop the running timer without logging anything
    Reset,

    /// List logged sessions
    List {
        #[arg(long, value_name = "N", help = "Show only the last N sessions")]
        last: Option<usize>,

        #[arg(long, value_name = "N", help = "Show sessions from the last N days")]
        days: Option<i64>,
    },

    /// Show statistics over the session log
    Stats {
        #[arg(long, value_name = "N", help = "Only consider the last N days")]
        days: Option<i64>,
    },

    /// Create a backup copy of the database
    Backup {
        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(long)]
        compress: bool,

        #[arg(long, short = 'f', help = "Overwrite an existing file without asking")]
        force: bool,
    },

    /// Export the session log
    Export {
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(
            long,
            value_name = "RANGE",
            help = "Filter export by year/month/day or a custom range (A:B)"
        )]
        range: Option<String>,

        #[arg(long, short = 'f')]
        force: bool,
    },
}
