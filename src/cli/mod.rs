pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::config;
use crate::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "dynaform")]
#[command(about = "Dynaform administration - migrations, users and forms")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "User account management")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "Form schema inspection")]
    Form {
        #[command(subcommand)]
        cmd: commands::form::FormCommands,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Pool for the configured database; connects on first use
pub fn connect() -> anyhow::Result<PgPool> {
    Ok(DatabaseManager::connect_lazy(&config::config().database)?)
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::User { cmd } => commands::user::handle(cmd, output_format).await,
        Commands::Form { cmd } => commands::form::handle(cmd, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_create() {
        let cli = Cli::try_parse_from([
            "dynaform", "--json", "user", "create", "ada", "--email", "ada@example.com", "--password", "analytical-engine",
        ])
        .unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        match cli.command {
            Commands::User {
                cmd: commands::user::UserCommands::Create { username, email, password },
            } => {
                assert_eq!(username, "ada");
                assert_eq!(email.as_deref(), Some("ada@example.com"));
                assert_eq!(password, "analytical-engine");
            }
            _ => panic!("expected user create"),
        }
    }

    #[test]
    fn password_is_required_for_user_create() {
        assert!(Cli::try_parse_from(["dynaform", "user", "create", "ada"]).is_err());
    }
}
