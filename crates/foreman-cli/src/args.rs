//! CLI argument definitions using clap
//!
//! - foreman memory put|get|delete|export|clear
//! - foreman session new|send|close|observe|list
//! - foreman runs list|logs|tree|export|purge
//! - foreman run start "<request>"
//! - foreman tools

use clap::{Parser, Subcommand};
use foreman_core::SandboxSpec;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "foreman")]
#[command(about = "Foreman - session orchestration and execution tracing for coding agents")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (defaults to ~/.foreman/foreman.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the databases and session logs
    #[arg(long, global = true, env = "FOREMAN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Record traces under this run instead of starting a new one
    #[arg(long, global = true, env = "FOREMAN_RUN_ID")]
    pub run_id: Option<String>,

    /// Sandbox hosting new sessions: `local` or `docker:<label>`
    #[arg(long, global = true)]
    pub sandbox: Option<SandboxSpec>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read and write working memory modules
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Manage sandboxed terminal sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Inspect recorded runs and their traces
    Runs {
        #[command(subcommand)]
        action: RunsAction,
    },

    /// Begin a run for a new user request
    Run {
        #[command(subcommand)]
        action: RunAction,
    },

    /// Print the JSON schemas of all tools
    Tools,
}

#[derive(Subcommand, Clone)]
pub enum MemoryAction {
    /// Store a module (DATA is parsed as JSON, or kept as a string)
    Put { name: String, data: String },

    /// Print a module
    Get { name: String },

    /// Remove a module
    Delete { name: String },

    /// Print every module as one JSON object
    Export,

    /// Remove every module
    Clear,
}

#[derive(Subcommand, Clone)]
pub enum SessionAction {
    /// Start a new session and print its id
    New,

    /// Type a command into a session
    Send { session_id: String, command: String },

    /// Terminate a session
    Close { session_id: String },

    /// Print the session output inside a time window
    Observe {
        session_id: String,

        /// Seconds to look back from now
        #[arg(long, short)]
        offset: Option<u64>,

        /// Seconds to keep watching
        #[arg(long, short, default_value_t = 0)]
        duration: u64,
    },

    /// List registered sessions with their history
    List,
}

#[derive(Subcommand, Clone)]
pub enum RunsAction {
    /// List recorded runs
    List,

    /// Print the records of a run in write order
    Logs { run_id: String },

    /// Print the call tree of a run
    Tree { run_id: String },

    /// Write a run's records as JSON
    Export {
        run_id: String,

        /// Output file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Delete a run's records
    Purge { run_id: String },
}

#[derive(Subcommand, Clone)]
pub enum RunAction {
    /// Close stale sessions, clear working memory and store the request
    Start { request: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_observe_with_global_flags() {
        let cli = Cli::try_parse_from([
            "foreman",
            "--data-dir",
            "/tmp/fm",
            "session",
            "observe",
            "session_2",
            "-d",
            "3",
            "--sandbox",
            "docker:dev",
        ])
        .unwrap();

        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/fm")));
        assert_eq!(
            cli.sandbox,
            Some(SandboxSpec::Docker {
                label: "dev".to_string()
            })
        );
        match cli.command {
            Commands::Session {
                action:
                    SessionAction::Observe {
                        session_id,
                        offset,
                        duration,
                    },
            } => {
                assert_eq!(session_id, "session_2");
                assert_eq!(offset, None);
                assert_eq!(duration, 3);
            }
            _ => panic!("expected session observe"),
        }
    }
}
