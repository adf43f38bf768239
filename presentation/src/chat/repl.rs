//! REPL (Read-Eval-Print Loop) for interactive chat

use super::request::{cancel_on_ctrl_c, print_stream};
use crate::ConsoleFormatter;
use colored::Colorize;
use docuforge_application::{DocumentOrchestrator, OrchestrationRequest};
use docuforge_domain::{Message, OutputFormat, SessionId};
use serde_json::{Map, Value};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Interactive chat REPL over one document session
pub struct ChatRepl {
    orchestrator: Arc<DocumentOrchestrator>,
    session: SessionId,
    history: Vec<Message>,
    /// Turns (user + assistant pairs) kept for context
    history_turns: usize,
    format: OutputFormat,
    stream: bool,
}

/// What a slash command asks the loop to do
#[derive(Debug, PartialEq)]
enum CommandOutcome {
    Continue,
    Exit,
}

impl ChatRepl {
    pub fn new(orchestrator: Arc<DocumentOrchestrator>, session: SessionId) -> Self {
        Self {
            orchestrator,
            session,
            history: Vec::new(),
            history_turns: 10,
            format: OutputFormat::Text,
            stream: false,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_history_turns(mut self, turns: usize) -> Self {
        self.history_turns = turns;
        self
    }

    /// Run the interactive REPL until `/quit` or end of input
    pub async fn run(&mut self) -> std::io::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        self.print_welcome();

        loop {
            print!("{} ", ">>>".cyan().bold());
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                println!("Bye!");
                break;
            };
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            if line.starts_with('/') {
                if self.handle_command(line) == CommandOutcome::Exit {
                    break;
                }
                continue;
            }

            self.process_message(line).await;
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│            Docuforge - Chat Mode            │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Session: {}", self.session);
        println!(
            "Providers: {}",
            self.orchestrator
                .current_state(&self.session)
                .available_providers
                .join(", ")
        );
        println!();
        Self::print_help();
    }

    fn print_help() {
        println!("Commands:");
        println!("  /help, /h, /?        - Show this help");
        println!("  /state               - Show session state");
        println!("  /messages            - Show queued agent messages");
        println!("  /config              - Show agent configuration");
        println!("  /set <field> <value> - Change one configuration field");
        println!("  /reset               - Forget this session's state and history");
        println!("  /quit, /exit, /q     - Exit chat");
        println!();
    }

    /// Handle slash commands
    fn handle_command(&mut self, line: &str) -> CommandOutcome {
        let mut parts = line.splitn(3, ' ');
        let command = parts.next().unwrap_or_default();

        match command {
            "/quit" | "/exit" | "/q" => {
                println!("Bye!");
                return CommandOutcome::Exit;
            }
            "/help" | "/h" | "/?" => {
                println!();
                Self::print_help();
            }
            "/state" => {
                let state = self.orchestrator.current_state(&self.session);
                println!("{}", ConsoleFormatter::format_state(&state));
            }
            "/messages" => {
                let messages = self.orchestrator.drain_messages(&self.session);
                if messages.is_empty() {
                    println!("No queued messages");
                }
                for message in messages {
                    println!(
                        "  [{}] {}: {}",
                        message.agent_type,
                        message.message_type.as_str(),
                        message.content
                    );
                }
            }
            "/config" => {
                let config = self.orchestrator.get_config(Some(&self.session));
                match serde_json::to_string_pretty(config.as_ref()) {
                    Ok(json) => println!("{}", json),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            "/set" => match (parts.next(), parts.next()) {
                (Some(field), Some(value)) => self.set_field(field, value),
                _ => println!("Usage: /set <field> <value>"),
            },
            "/reset" => {
                self.orchestrator.end_session(&self.session);
                self.history.clear();
                println!("Session {} reset", self.session);
            }
            _ => {
                println!("Unknown command: {}", command);
                println!("Type /help for available commands");
            }
        }
        CommandOutcome::Continue
    }

    fn set_field(&self, field: &str, value: &str) {
        let mut updates = Map::new();
        updates.insert(field.to_string(), parse_value(value));
        match self
            .orchestrator
            .update_config(Some(&self.session), &updates)
        {
            Ok(_) => println!("{} = {}", field, value),
            Err(e) => eprintln!("{} {}", "Error:".red(), e),
        }
    }

    async fn process_message(&mut self, message: &str) {
        println!();

        let (token, watcher) = cancel_on_ctrl_c();
        let request = OrchestrationRequest::new(self.session.clone(), message)
            .with_history(self.history.clone())
            .with_cancellation(token);

        let reply = if self.stream {
            let handle = self.orchestrator.stream_response(request);
            Some(print_stream(handle, &mut std::io::stdout()).await)
        } else {
            let result = self.orchestrator.process_user_request(request).await;
            let output = match self.format {
                OutputFormat::Text => ConsoleFormatter::format(&result),
                OutputFormat::Json => ConsoleFormatter::format_json(&result),
            };
            println!("{}", output);
            result.response
        };
        watcher.abort();

        if let Some(reply) = reply {
            self.remember(message, reply);
        }
        println!();
    }

    fn remember(&mut self, message: &str, reply: String) {
        self.history.push(Message::user(message));
        self.history.push(Message::assistant(reply));
        let keep = self.history_turns * 2;
        if self.history.len() > keep {
            self.history.drain(..self.history.len() - keep);
        }
    }
}

/// Numbers and booleans are passed as JSON, anything else as a string.
fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => value,
        _ => Value::String(raw.trim_matches('"').to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docuforge_application::{
        AgentConfigStore, GatewayError, GenerateOptions, LlmProvider, ProviderRegistry,
        ProviderRouter,
    };
    use docuforge_domain::AgentConfig;

    struct EchoProvider;

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn generate(
            &self,
            messages: &[Message],
            _model: &str,
            _options: &GenerateOptions,
        ) -> Result<String, GatewayError> {
            Ok(format!("echo: {}", messages.len()))
        }
    }

    fn repl() -> ChatRepl {
        let config = AgentConfig::uniform("mock", "mock");
        let registry = ProviderRegistry::new().with(Arc::new(EchoProvider));
        let router = ProviderRouter::new(Arc::new(registry), Arc::new(config.clone()));
        let configs = Arc::new(AgentConfigStore::new(config).unwrap());
        let orchestrator = Arc::new(DocumentOrchestrator::new(router, configs));
        ChatRepl::new(orchestrator, SessionId::new("chat"))
    }

    #[test]
    fn test_history_keeps_recent_turns() {
        let mut repl = repl().with_history_turns(2);
        for i in 0..5 {
            repl.remember(&format!("q{i}"), format!("a{i}"));
        }
        assert_eq!(repl.history.len(), 4);
        assert_eq!(repl.history[0].content, "q3");
        assert_eq!(repl.history[3].content, "a4");
    }

    #[test]
    fn test_set_updates_session_config() {
        let mut repl = repl();
        assert_eq!(repl.handle_command("/set timeout_seconds 60"), CommandOutcome::Continue);
        let config = repl.orchestrator.get_config(Some(&repl.session));
        assert_eq!(config.timeout_seconds, 60);
        assert_eq!(repl.orchestrator.get_config(None).timeout_seconds, 30);
    }

    #[test]
    fn test_quit_and_reset() {
        let mut repl = repl();
        repl.remember("q", "a".to_string());
        assert_eq!(repl.handle_command("/reset"), CommandOutcome::Continue);
        assert!(repl.history.is_empty());
        assert_eq!(repl.handle_command("/q"), CommandOutcome::Exit);
    }

    #[tokio::test]
    async fn test_process_message_records_reply() {
        let mut repl = repl();
        repl.process_message("hi").await;
        assert_eq!(repl.history.len(), 2);
        assert_eq!(repl.history[0].content, "hi");
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("45"), Value::from(45));
        assert_eq!(parse_value("true"), Value::Bool(true));
        assert_eq!(parse_value("claude"), Value::from("claude"));
        assert_eq!(parse_value("\"gpt-4o\""), Value::from("gpt-4o"));
    }
}
