//! Ask command handler.
//!
//! Runs one question through the pipeline without history.

use clap::Args;
use dulich_core::{config::AppConfig, AppError, AppResult};
use dulich_pipeline::{replies, Pipeline};

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: String,

    /// Output the full reply as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let query = self.query.trim();
        if query.is_empty() {
            println!("{}", replies::EMPTY_QUERY);
            return Ok(());
        }

        let pipeline = Pipeline::from_config(config)?;
        let reply = pipeline.answer(query, &[]).await;

        if self.json {
            let value = serde_json::json!({
                "response": reply.response,
                "error": reply.error,
                "source": reply.source,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            println!("{}", reply.response);
        }

        if reply.error {
            return Err(AppError::Generation(reply.response));
        }

        Ok(())
    }
}
