//! Chat command handler.
//!
//! Interactive read-loop over the pipeline. History lives here, on the
//! caller side; the pipeline itself is stateless across invocations.

use clap::Args;
use dulich_core::{config::AppConfig, AppResult, CancelToken};
use dulich_pipeline::{replies, HistoryTurn, Pipeline};
use std::io::{BufRead, Write};

/// Interactive chat with conversation history
#[derive(Args, Debug)]
pub struct ChatCommand {}

impl ChatCommand {
    /// Execute the chat read-loop.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let pipeline = Pipeline::from_config(config)?;
        let mut history: Vec<HistoryTurn> = Vec::new();

        println!("💬 Chào bạn! Mình là chatbot du lịch Bình Định. Hỏi mình bất cứ điều gì nhé! (Nhập 'exit' để thoát)");

        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();

        loop {
            print!("🔍 Nhập câu hỏi: ");
            stdout.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }
            let query = line.trim();

            if query.eq_ignore_ascii_case("exit") {
                println!("👋 Tạm biệt! Hẹn gặp lại bạn!");
                break;
            }

            if query.is_empty() {
                println!("{}", replies::EMPTY_QUERY);
                continue;
            }

            // One private token per invocation; a trigger (e.g. a
            // signal handler) can cancel in-flight work through it.
            let cancel = CancelToken::new();
            let reply = pipeline.answer_with_cancel(query, &history, &cancel).await;

            if reply.error {
                println!("{}", reply.response);
                continue;
            }

            println!("💬 Trả lời: {}", reply.response);
            history.push(HistoryTurn::new("user", query));
            history.push(HistoryTurn::new("assistant", reply.response));
        }

        Ok(())
    }
}
