//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for answers and reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored, human-readable text
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

/// CLI arguments for deepseek-wrapper
#[derive(Parser, Debug)]
#[command(name = "deepseek-wrapper")]
#[command(author, version, about = "DeepSeek chat client with tool calling")]
#[command(long_about = r#"
DeepSeek chat client with tool calling.

The model can call built-in tools (calculator, weather, date_time,
web_search, wolfram_alpha, email) while answering. Tool results are
cached per tool and fed back into the conversation.

Configuration files are loaded from (in priority order):
1. DEEPSEEK_* environment variables
2. --config <path>         Explicit config file
3. ./deepseek-wrapper.toml Project-level config
4. ~/.config/deepseek-wrapper/config.toml   Global config

Example:
  deepseek-wrapper
  deepseek-wrapper ask "What's 12*7 and the weather in Paris?"
  deepseek-wrapper --model deepseek-reasoner --extract-answer ask "Is 1001 prime?"
  deepseek-wrapper tools status
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors and suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Model to use (overrides api.default_model)
    #[arg(short, long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Chat without tools
    #[arg(long, global = true)]
    pub no_tools: bool,

    /// Show only the final answer of reasoning models
    #[arg(long, global = true)]
    pub extract_answer: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

impl Cli {
    /// The subcommand to run; no subcommand means interactive chat.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive chat (default)
    Chat,

    /// Ask one question, letting the model call tools
    Ask {
        /// The question to ask
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    /// Plain text completion without chat history or tools
    Complete {
        /// Prompt to complete
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    /// Inspect and manage tools
    #[command(subcommand)]
    Tools(ToolsCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ToolsCommand {
    /// List registered tools and their parameters
    List,
    /// Show tool health and cache statistics
    Status,
    /// Clear cached tool results
    ClearCache(ToolSelector),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ToolSelector {
    /// Only this tool (default: all tools)
    #[arg(long, value_name = "NAME")]
    pub tool: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_chat() {
        let cli = Cli::parse_from(["deepseek-wrapper", "-vv"]);
        assert_eq!(cli.resolved_command(), Command::Chat);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output, OutputFormat::Text);
    }

    #[test]
    fn test_ask_joins_words() {
        let cli = Cli::parse_from([
            "deepseek-wrapper",
            "ask",
            "--model",
            "deepseek-reasoner",
            "--extract-answer",
            "what",
            "is",
            "2+2",
        ]);
        assert_eq!(cli.model.as_deref(), Some("deepseek-reasoner"));
        assert!(cli.extract_answer);
        let Command::Ask { prompt } = cli.resolved_command() else {
            panic!("expected ask");
        };
        assert_eq!(prompt.join(" "), "what is 2+2");
    }

    #[test]
    fn test_tools_clear_cache_with_tool() {
        let cli = Cli::parse_from([
            "deepseek-wrapper",
            "--output",
            "json",
            "tools",
            "clear-cache",
            "--tool",
            "weather",
        ]);
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(
            cli.resolved_command(),
            Command::Tools(ToolsCommand::ClearCache(ToolSelector {
                tool: Some("weather".to_string())
            }))
        );
    }

    #[test]
    fn test_ask_requires_prompt() {
        assert!(Cli::try_parse_from(["deepseek-wrapper", "ask"]).is_err());
    }
}
