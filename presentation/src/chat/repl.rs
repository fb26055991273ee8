//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::chat::session::ChatSession;
use crate::config::ReplConfig;
use crate::output::console::ConsoleFormatter;
use crate::progress::reporter::ConsoleEventSink;
use colored::Colorize;
use deepseek_application::{ToolAdminPort, ToolExecutorPort};
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Slash commands understood by the REPL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Reset,
    Tools,
    Status,
    ClearCache(Option<String>),
    Quit,
    Unknown(String),
}

impl ReplCommand {
    /// Parse a line starting with `/`. Other lines are not commands.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if !line.starts_with('/') {
            return None;
        }
        let mut parts = line.splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or("");
        let arg = parts
            .next()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        Some(match command {
            "/help" | "/h" | "/?" => ReplCommand::Help,
            "/reset" | "/clear" => ReplCommand::Reset,
            "/tools" => ReplCommand::Tools,
            "/status" => ReplCommand::Status,
            "/clear-cache" => ReplCommand::ClearCache(arg),
            "/quit" | "/exit" | "/q" => ReplCommand::Quit,
            other => ReplCommand::Unknown(other.to_string()),
        })
    }
}

/// Result of handling a command
enum CommandResult {
    Continue,
    Exit,
}

/// Interactive chat REPL
pub struct ChatRepl {
    session: ChatSession,
    tools: Option<Arc<dyn ToolExecutorPort>>,
    admin: Option<Arc<dyn ToolAdminPort>>,
    config: ReplConfig,
}

impl ChatRepl {
    pub fn new(session: ChatSession) -> Self {
        Self {
            session,
            tools: None,
            admin: None,
            config: ReplConfig::default(),
        }
    }

    /// Enable `/tools`, `/status` and `/clear-cache`
    pub fn with_tools(
        mut self,
        tools: Arc<dyn ToolExecutorPort>,
        admin: Arc<dyn ToolAdminPort>,
    ) -> Self {
        self.tools = Some(tools);
        self.admin = Some(admin);
        self
    }

    pub fn with_config(mut self, config: ReplConfig) -> Self {
        self.config = config;
        self
    }

    fn editor(&self) -> Reedline {
        let editor = Reedline::create();
        let Some(path) = &self.config.history_file else {
            return editor;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match FileBackedHistory::with_file(self.config.history_size, path.clone()) {
            Ok(history) => editor.with_history(Box::new(history)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Chat history unavailable");
                editor
            }
        }
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> std::io::Result<()> {
        let mut editor = self.editor();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("deepseek".to_string()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        loop {
            match editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if let Some(command) = ReplCommand::parse(line) {
                        match self.handle_command(command) {
                            CommandResult::Exit => break,
                            CommandResult::Continue => continue,
                        }
                    }

                    self.process_prompt(line).await;
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
                _ => {
                    println!("^C");
                }
            }
        }

        Ok(())
    }

    fn print_welcome(&self) {
        let sampling = self.session.sampling();
        println!();
        println!("{}", "╭─────────────────────────────────────────────╮".cyan());
        println!("{}", "│        DeepSeek Wrapper - Chat Mode         │".cyan());
        println!("{}", "╰─────────────────────────────────────────────╯".cyan());
        println!();
        println!("{} {}", "Model:".bold(), sampling.model);
        match &self.tools {
            Some(tools) if self.session.uses_tools() => {
                let names = tools.available_tools();
                let names = if names.is_empty() {
                    "none".to_string()
                } else {
                    names.join(", ")
                };
                println!("{} {}", "Tools:".bold(), names);
            }
            _ => println!("{} {}", "Tools:".bold(), "disabled".dimmed()),
        }
        println!();
        Self::print_help();
    }

    fn print_help() {
        println!("Commands:");
        println!("  {}              - Show this help", "/help".cyan());
        println!("  {}             - Start a new conversation", "/reset".cyan());
        println!("  {}             - List available tools", "/tools".cyan());
        println!("  {}            - Tool health and cache statistics", "/status".cyan());
        println!("  {} [tool] - Clear tool result caches", "/clear-cache".cyan());
        println!("  {}              - Exit chat", "/quit".cyan());
        println!();
    }

    fn handle_command(&mut self, command: ReplCommand) -> CommandResult {
        match command {
            ReplCommand::Quit => {
                println!("Bye!");
                return CommandResult::Exit;
            }
            ReplCommand::Help => {
                println!();
                Self::print_help();
            }
            ReplCommand::Reset => {
                let turns = self.session.turns();
                self.session.reset();
                println!("{} ({} exchanges forgotten)", "Conversation reset".green(), turns);
            }
            ReplCommand::Tools => match &self.tools {
                Some(tools) => print!("{}", ConsoleFormatter::format_tool_list(&tools.tool_specs())),
                None => println!("{}", "Tools are disabled".yellow()),
            },
            ReplCommand::Status => match &self.admin {
                Some(admin) => print!("{}", ConsoleFormatter::format_status(&admin.status_report())),
                None => println!("{}", "Tools are disabled".yellow()),
            },
            ReplCommand::ClearCache(tool) => match &self.admin {
                Some(admin) => {
                    let cleared = admin.clear_cache(tool.as_deref());
                    print!("{}", ConsoleFormatter::format_cleared(&cleared));
                }
                None => println!("{}", "Tools are disabled".yellow()),
            },
            ReplCommand::Unknown(cmd) => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
            }
        }
        CommandResult::Continue
    }

    /// Run one turn; Ctrl-C while waiting cancels it.
    async fn process_prompt(&mut self, prompt: &str) {
        println!();
        let sink = ConsoleEventSink::new().with_progress(self.config.show_progress);

        let token = CancellationToken::new();
        let watcher = {
            let token = token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    token.cancel();
                }
            })
        };

        self.session.send(prompt, &sink, Some(token)).await;
        watcher.abort();
        println!();
    }
}
