use clap::{Parser, Subcommand};

/// jobboard — notification client for the job board API
#[derive(Parser)]
#[command(name = "jobboard", version, about)]
pub struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch and print notifications once
    List {
        /// Only show unread notifications
        #[arg(long)]
        unread: bool,
    },

    /// Poll for notifications until interrupted
    Watch {
        /// Polling interval in milliseconds (defaults to JOBBOARD_POLL_INTERVAL_MS)
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Mark a notification as read
    Read { id: String },

    /// Mark all unread notifications as read
    ReadAll,
}
