//! Models command handlers.

use clap::{Args, Subcommand};
use concierge_core::{config::AppConfig, AppResult};
use concierge_llm::{create_client, ModelObject};

/// List or delete models
#[derive(Args, Debug)]
pub struct ModelsCommand {
    #[command(subcommand)]
    pub command: ModelsSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ModelsSubcommand {
    /// List model ids visible to the credential
    List {
        /// Only fine-tuned (ft:) models
        #[arg(long)]
        fine_tuned: bool,
    },

    /// Delete a fine-tuned model
    Delete {
        /// Model id
        model: String,
    },
}

impl ModelsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let client = create_client(config)?;

        match &self.command {
            ModelsSubcommand::List { fine_tuned } => {
                tracing::info!("Listing models");
                let models = client.list_models().await?;
                for id in model_ids(&models, *fine_tuned) {
                    println!("{}", id);
                }
            }
            ModelsSubcommand::Delete { model } => {
                tracing::info!(model = %model, "Deleting model");

                // Aborts when the model is not visible to this credential
                let info = client.retrieve_model(model).await?;
                println!(
                    "model found. id: {}, owned_by: {}",
                    info.id,
                    info.owned_by.as_deref().unwrap_or("-")
                );

                match client.delete_model(model).await {
                    Ok(deleted) => println!("Deleted: {} -> {}", deleted.id, deleted.deleted),
                    Err(e) => {
                        tracing::error!(model = %model, error = %e, "Delete failed");
                        println!("delete failed: {}", e);
                    }
                }
            }
        }

        Ok(())
    }
}

fn model_ids(models: &[ModelObject], fine_tuned_only: bool) -> Vec<&str> {
    models
        .iter()
        .filter(|model| !fine_tuned_only || model.is_fine_tuned())
        .map(|model| model.id.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(id: &str) -> ModelObject {
        ModelObject {
            id: id.to_string(),
            owned_by: None,
            created: None,
        }
    }

    #[test]
    fn test_model_ids_filter() {
        let models = vec![model("gpt-4"), model("ft:gpt-3.5-turbo-0125:org::abc")];
        assert_eq!(model_ids(&models, false).len(), 2);
        assert_eq!(
            model_ids(&models, true),
            vec!["ft:gpt-3.5-turbo-0125:org::abc"]
        );
    }
}
