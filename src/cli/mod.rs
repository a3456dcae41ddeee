// Keysafe — CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: init, add, get, update, delete, list, audit.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::execute;

/// Keysafe — encrypted secret storage with an audit trail.
#[derive(Parser, Debug)]
#[command(name = "keysafe")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database (overrides the config file).
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// 64 hex characters, or a passphrase to derive the key from.
    #[arg(
        long,
        global = true,
        env = "KEYSAFE_ENCRYPTION_KEY",
        hide_env_values = true
    )]
    pub encryption_key: Option<String>,

    /// Name recorded in audit entries.
    #[arg(long, global = true, env = "USER")]
    pub actor: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory, database and default config, and print a
    /// fresh encryption key.
    Init,

    /// Store a new secret.
    Add {
        /// Secret name. Prompted for if omitted.
        #[arg(long)]
        key: Option<String>,

        /// Secret value. Prompted for (hidden) if omitted, which keeps it out
        /// of shell history.
        #[arg(long)]
        value: Option<String>,

        /// Overwrite the secret if it already exists.
        #[arg(long, default_value = "false")]
        force: bool,
    },

    /// Print the decrypted value of a secret.
    Get {
        #[arg(long)]
        key: Option<String>,
    },

    /// Replace the value of an existing secret.
    Update {
        #[arg(long)]
        key: Option<String>,

        #[arg(long)]
        value: Option<String>,
    },

    /// Delete a secret.
    Delete {
        #[arg(long)]
        key: Option<String>,

        /// Skip the confirmation prompt.
        #[arg(long, short = 'y', default_value = "false")]
        yes: bool,
    },

    /// List stored secret names (never values).
    List {
        /// Emit JSON instead of a table.
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Show the audit log, for one key or the most recent entries.
    Audit {
        #[arg(long)]
        key: Option<String>,

        /// Number of entries to show when no key is given.
        #[arg(long, default_value = "50")]
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_with_flags() {
        let cli = Cli::try_parse_from([
            "keysafe", "add", "--key", "api_key", "--value", "sk-123", "--force",
        ])
        .unwrap();

        match cli.command {
            Commands::Add { key, value, force } => {
                assert_eq!(key.as_deref(), Some("api_key"));
                assert_eq!(value.as_deref(), Some("sk-123"));
                assert!(force);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "keysafe",
            "get",
            "--key",
            "k",
            "--database",
            "/tmp/x.db",
            "--actor",
            "ci",
        ])
        .unwrap();

        assert_eq!(cli.database, Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(cli.actor.as_deref(), Some("ci"));
        assert!(matches!(cli.command, Commands::Get { key: Some(ref k) } if k == "k"));
    }

    #[test]
    fn test_delete_defaults_to_confirmation() {
        let cli = Cli::try_parse_from(["keysafe", "delete"]).unwrap();
        assert!(matches!(cli.command, Commands::Delete { key: None, yes: false }));
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["keysafe", "serve"]).is_err());
    }
}
