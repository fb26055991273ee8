//! CLI entrypoint for deepseek-wrapper
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result};
use clap::Parser;
use deepseek_application::{
    ChatEventSink, ChatWithToolsUseCase, ConversationLogger, LlmGateway, NoChatEvents,
    NoConversationLogger, OrchestrationParams, RunChatUseCase, RunCompletionUseCase,
    SamplingParams, ToolExecutorPort,
};
use deepseek_infrastructure::{
    ConfigLoader, DeepSeekGateway, FileConfig, JsonSchemaToolConverter, JsonlConversationLogger,
    ToolRegistry,
};
use deepseek_presentation::{
    AnswerReport, ChatBackend, ChatRepl, ChatSession, Cli, Command, ConsoleEventSink,
    OutputFormat, ReplConfig, ToolsCommand, formatter_for,
};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    // Show config sources and exit
    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(ExitCode::SUCCESS);
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()?
    } else {
        ConfigLoader::load(cli.config.as_ref())?
    };

    let _log_guard = init_logging(&cli, config.logging.log_file.as_deref())?;
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded .env");
    }
    for issue in config.validate() {
        warn!("{}", issue);
    }

    info!("Starting deepseek-wrapper");

    let mut sampling = config.api.sampling();
    if let Some(model) = &cli.model {
        sampling = sampling.with_model(model);
    }
    let mut params = config.orchestration_params();
    if cli.extract_answer {
        params = params.with_extract_answer_only(true);
    }

    // === Dependency Injection ===
    let registry = Arc::new(ToolRegistry::new());
    let tools_enabled = !cli.no_tools || matches!(cli.resolved_command(), Command::Tools(_));
    if tools_enabled {
        config.tools.to_builtin_tools(env_var).register_all(&registry);
    }

    match cli.resolved_command() {
        Command::Tools(command) => Ok(run_tools_command(&cli, &registry, command)),
        Command::Complete { prompt } => {
            let deps = Deps::build(&config)?;
            Ok(run_complete(&cli, deps, &prompt.join(" "), &sampling).await)
        }
        Command::Ask { prompt } => {
            let deps = Deps::build(&config)?;
            let mut session = chat_session(&cli, &config, deps, &registry, sampling, params);
            Ok(run_ask(&cli, &mut session, &prompt.join(" ")).await)
        }
        Command::Chat => {
            let deps = Deps::build(&config)?;
            let session = chat_session(&cli, &config, deps, &registry, sampling, params);
            let repl_config = ReplConfig::default().with_progress(!cli.quiet);
            let mut repl = ChatRepl::new(session).with_config(repl_config);
            if !cli.no_tools {
                repl = repl.with_tools(registry.clone(), registry.clone());
            }
            repl.run().await.context("Chat REPL failed")?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Environment lookup for secrets; empty values count as unset.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// stderr logging from `-v`/`-q` (or `RUST_LOG`), plus an optional
/// daily-rotated file.
fn init_logging(cli: &Cli, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace", // -vvv or more
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut guard = None;
    let file_layer = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .context("logging.log_file must name a file")?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create log directory {}", dir.display()))?;
            let (writer, worker) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, name));
            guard = Some(worker);
            Some(fmt::layer().with_writer(writer).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Adapters that need the API configuration
struct Deps {
    gateway: Arc<dyn LlmGateway>,
    logger: Arc<dyn ConversationLogger>,
}

impl Deps {
    fn build(config: &FileConfig) -> Result<Self> {
        let deepseek = config.api.to_deepseek_config(env_var);
        if deepseek.api_key.is_empty() {
            anyhow::bail!(
                "No DeepSeek API key found. Set {} in the environment or a .env file",
                config.api.api_key_env
            );
        }
        let gateway: Arc<dyn LlmGateway> =
            Arc::new(DeepSeekGateway::new(deepseek).context("Failed to create DeepSeek client")?);

        let logger: Arc<dyn ConversationLogger> = match &config.logging.conversation_log {
            Some(path) => Arc::new(JsonlConversationLogger::open(path).with_context(|| {
                format!("Cannot open conversation log {}", path.display())
            })?),
            None => Arc::new(NoConversationLogger),
        };

        Ok(Self { gateway, logger })
    }
}

fn chat_session(
    cli: &Cli,
    config: &FileConfig,
    deps: Deps,
    registry: &Arc<ToolRegistry>,
    sampling: SamplingParams,
    params: OrchestrationParams,
) -> ChatSession {
    let backend = if cli.no_tools {
        ChatBackend::Plain(
            RunChatUseCase::new(deps.gateway).with_conversation_logger(deps.logger),
        )
    } else {
        let executor: Arc<dyn ToolExecutorPort> = registry.clone();
        ChatBackend::Tools(
            ChatWithToolsUseCase::new(deps.gateway, executor, Arc::new(JsonSchemaToolConverter))
                .with_conversation_logger(deps.logger),
        )
    };

    ChatSession::new(backend)
        .with_sampling(sampling)
        .with_params(params)
        .with_system_prompt(config.chat.system_prompt.clone())
        .with_realtime_context(config.chat.realtime_context)
}

/// Cancellation token tripped by Ctrl-C, with the watcher task to abort.
fn ctrl_c_token() -> (CancellationToken, tokio::task::JoinHandle<()>) {
    let token = CancellationToken::new();
    let watcher = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        })
    };
    (token, watcher)
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run_ask(cli: &Cli, session: &mut ChatSession, prompt: &str) -> ExitCode {
    // Stream to the terminal unless output is meant for scripts
    let streaming = cli.output == OutputFormat::Text && !cli.quiet;
    let sink: Box<dyn ChatEventSink> = if streaming {
        Box::new(ConsoleEventSink::new())
    } else {
        Box::new(NoChatEvents)
    };

    let (token, watcher) = ctrl_c_token();
    let report = session.send(prompt, sink.as_ref(), Some(token)).await;
    watcher.abort();

    if !streaming {
        print!("{}", formatter_for(cli.output).format_answer(&report));
    }
    exit_code(report.is_success())
}

async fn run_complete(cli: &Cli, deps: Deps, prompt: &str, sampling: &SamplingParams) -> ExitCode {
    let use_case = RunCompletionUseCase::new(deps.gateway).with_conversation_logger(deps.logger);
    let report = match use_case.execute(prompt, sampling).await {
        Ok(text) => AnswerReport::completion(text, sampling.model.clone()),
        Err(e) => AnswerReport::failed(e),
    };
    print!("{}", formatter_for(cli.output).format_answer(&report));
    exit_code(report.is_success())
}

fn run_tools_command(cli: &Cli, registry: &ToolRegistry, command: ToolsCommand) -> ExitCode {
    let formatter = formatter_for(cli.output);
    let output = match command {
        ToolsCommand::List => formatter.format_tool_list(&registry.tool_specs()),
        ToolsCommand::Status => formatter.format_status(&registry.status_report()),
        ToolsCommand::ClearCache(selector) => {
            formatter.format_cleared(&registry.clear_cache(selector.tool.as_deref()))
        }
    };
    print!("{}", output);
    ExitCode::SUCCESS
}
