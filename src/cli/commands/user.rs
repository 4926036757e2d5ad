use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{describe_field_errors, output_success};
use crate::cli::{connect, OutputFormat};
use crate::services::{AccountError, AccountService, RegisterInput};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user account")]
    Create {
        #[arg(help = "Username")]
        username: String,

        #[arg(long, help = "Email address")]
        email: Option<String>,

        #[arg(long, help = "Initial password")]
        password: String,
    },

    #[command(about = "Reset a user's password")]
    SetPassword {
        #[arg(help = "Username")]
        username: String,

        #[arg(long, help = "New password")]
        password: String,
    },
}

fn explain(err: AccountError) -> anyhow::Error {
    match err {
        AccountError::Validation(errors) => anyhow::anyhow!(describe_field_errors(&errors)),
        AccountError::UserNotFound(username) => anyhow::anyhow!("User '{}' not found", username),
        other => other.into(),
    }
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let service = AccountService::new(connect()?);

    match cmd {
        UserCommands::Create { username, email, password } => {
            let input = RegisterInput {
                username,
                password,
                email: email.unwrap_or_default(),
            };
            let user = service.register(&input).await.map_err(explain)?;

            output_success(
                &output_format,
                &format!("User '{}' created", user.username),
                Some(json!({ "user": { "id": user.id, "username": user.username, "email": user.email } })),
            )
        }
        UserCommands::SetPassword { username, password } => {
            service.set_password(&username, &password).await.map_err(explain)?;

            output_success(
                &output_format,
                &format!("Password updated for '{}'", username),
                Some(json!({ "username": username })),
            )
        }
    }
}
