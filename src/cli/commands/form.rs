use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_empty_collection;
use crate::cli::{connect, OutputFormat};
use crate::services::FormService;

#[derive(Subcommand)]
pub enum FormCommands {
    #[command(about = "List form schemas with their fields")]
    List,
}

pub async fn handle(cmd: FormCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        FormCommands::List => {
            let forms = FormService::new(connect()?).list_forms().await?;

            if forms.is_empty() {
                return output_empty_collection(&output_format, "forms", "No forms defined");
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "forms": forms }))?);
                }
                OutputFormat::Text => {
                    println!("{:<8} {:<30} {:<8} {}", "ID", "NAME", "FIELDS", "CREATED");
                    println!("{}", "-".repeat(70));

                    for form in &forms {
                        let created = form.created_at.format("%Y-%m-%d %H:%M").to_string();
                        println!("{:<8} {:<30} {:<8} {}", form.id, form.name, form.fields.len(), created);
                        for field in &form.fields {
                            println!("         {:>4}  {} ({})", field.order, field.label, field.field_type);
                        }
                    }
                }
            }

            Ok(())
        }
    }
}
