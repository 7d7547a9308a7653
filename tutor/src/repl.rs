//! Interactive tutoring REPL

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::engine::{ResponseKind, TutorEngine};
use crate::llm::Message;

/// Interactive tutoring session
pub struct ReplSession {
    engine: TutorEngine,
    user_id: String,
    history: Vec<Message>,
}

impl ReplSession {
    pub fn new(engine: TutorEngine, user_id: impl Into<String>) -> Self {
        Self {
            engine,
            user_id: user_id.into(),
            history: Vec::new(),
        }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input) {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.process_message(input).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C - just show new prompt
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D - exit
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("再见！");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "AI 学习导师".bright_cyan().bold());
        println!(
            "可以问我知识点、规划学习路径，或者随便聊聊。输入 {} 查看命令，{} 退出",
            "/help".yellow(),
            "/quit".yellow()
        );
        println!();
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");

        match cmd {
            "/help" | "/h" => {
                self.print_help();
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/clear" | "/c" => {
                self.history.clear();
                println!("{}", "对话历史已清空。".dimmed());
                SlashResult::Continue
            }
            "/stats" => {
                self.print_stats();
                SlashResult::Continue
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                SlashResult::Continue
            }
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:14} Show this help", "/help".yellow());
        println!("  {:14} Exit the session", "/quit".yellow());
        println!("  {:14} Clear conversation history", "/clear".yellow());
        println!("  {:14} Show LLM usage statistics", "/stats".yellow());
        println!();
    }

    fn print_stats(&self) {
        let stats = self.engine.usage_stats();
        println!();
        println!("{}", "LLM Usage".bright_cyan());
        println!("  Calls:            {}", stats.call_count);
        println!("  Estimated tokens: {}", stats.estimated_tokens);
        println!("  Errors:           {}", stats.error_count);
        println!("  Success rate:     {:.1}%", stats.success_rate);
        println!();
    }

    /// Send one message through the engine and render the envelope
    async fn process_message(&mut self, input: &str) {
        let response = self.engine.handle_message(&self.user_id, input, &self.history).await;

        println!();
        println!("{}", response.content);
        self.print_data_hints(&response);
        println!();

        self.history.push(Message::user(input));
        self.history.push(Message::assistant(response.content));
    }

    /// Render the structured part of an envelope as dimmed hints
    fn print_data_hints(&self, response: &crate::engine::Response) {
        match response.kind {
            ResponseKind::KnowledgeSearch => {
                if let Some(points) = response.data["knowledge_points"].as_array() {
                    let names: Vec<&str> = points.iter().filter_map(|p| p["name"].as_str()).collect();
                    if !names.is_empty() {
                        println!("{}", format!("相关知识点: {}", names.join("、")).dimmed());
                    }
                }
            }
            ResponseKind::LearningPath => {
                if let Some(paths) = response.data["paths"].as_array() {
                    for path in paths {
                        let steps: Vec<&str> = path["nodes"]
                            .as_array()
                            .into_iter()
                            .flatten()
                            .filter_map(|n| n["name"].as_str())
                            .collect();
                        if !steps.is_empty() {
                            println!("{}", format!("路径: {}", steps.join(" → ")).dimmed());
                        }
                    }
                }
            }
            ResponseKind::ContributionRequest => {
                if let Some(concepts) = response.data["new_concepts"].as_array() {
                    let names: Vec<&str> = concepts.iter().filter_map(|c| c.as_str()).collect();
                    if !names.is_empty() {
                        println!("{}", format!("图谱中还没有: {}", names.join("、")).dimmed());
                    }
                }
            }
            _ => {}
        }
    }
}

/// Result of handling a slash command
enum SlashResult {
    Continue,
    Quit,
}
