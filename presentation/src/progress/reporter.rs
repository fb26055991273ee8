//! Console rendering of chat events
//!
//! [`ConsoleEventSink`] streams assistant text as it arrives, shows a
//! spinner while waiting on the model and prints one line per tool call.

use colored::Colorize;
use deepseek_application::{ChatEventSink, tool_args_preview};
use deepseek_domain::ChatEvent;
use deepseek_domain::util::ellipsize;
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::time::Duration;

/// Tool summaries longer than this are cut on the progress line
const SUMMARY_WIDTH: usize = 80;

#[derive(Default)]
struct RenderState {
    spinner: Option<ProgressBar>,
    /// Text shown for the current assistant reply
    reply: String,
    /// Cursor is not at the start of a line
    mid_line: bool,
}

/// Prints chat events to a terminal
pub struct ConsoleEventSink {
    out: Mutex<Box<dyn Write + Send>>,
    state: Mutex<RenderState>,
    show_progress: bool,
}

impl ConsoleEventSink {
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            state: Mutex::new(RenderState::default()),
            show_progress: true,
        }
    }

    /// Disable the spinner (tool lines are still printed)
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn start_spinner(&self, state: &mut RenderState, message: String) {
        if !self.show_progress {
            return;
        }
        Self::stop_spinner(state);
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        state.spinner = Some(pb);
    }

    fn stop_spinner(state: &mut RenderState) {
        if let Some(pb) = state.spinner.take() {
            pb.finish_and_clear();
        }
    }

    fn write(&self, state: &mut RenderState, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut out = self.out.lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
        state.mid_line = !text.ends_with('\n');
    }

    fn end_line(&self, state: &mut RenderState) {
        if state.mid_line {
            self.write(state, "\n");
        }
    }

    fn write_line(&self, state: &mut RenderState, line: &str) {
        self.end_line(state);
        self.write(state, &format!("{line}\n"));
    }

    fn render(&self, state: &mut RenderState, event: ChatEvent) {
        match event {
            ChatEvent::UserReceived { .. } => {}
            ChatEvent::AssistantStart { round } => {
                state.reply.clear();
                let message = if round > 1 {
                    format!("Thinking (round {round})...")
                } else {
                    "Thinking...".to_string()
                };
                self.start_spinner(state, message);
            }
            ChatEvent::ContentChunk { content } => {
                Self::stop_spinner(state);
                self.write(state, &content);
                state.reply.push_str(&content);
            }
            ChatEvent::ReplaceContent { content } => {
                Self::stop_spinner(state);
                self.write_line(state, &format!("{}", "── Final answer ──".dimmed()));
                self.write(state, &content);
                state.reply = content;
            }
            ChatEvent::ToolInvoked {
                tool, arguments, ..
            } => {
                Self::stop_spinner(state);
                let preview = tool_args_preview(&arguments);
                let line = if preview.is_empty() {
                    format!("  {} {}", "→".cyan(), tool.bold())
                } else {
                    format!("  {} {}({})", "→".cyan(), tool.bold(), preview.dimmed())
                };
                self.write_line(state, &line);
                self.start_spinner(state, format!("Running {tool}..."));
            }
            ChatEvent::ToolCompleted {
                tool,
                success,
                summary,
                ..
            } => {
                Self::stop_spinner(state);
                let summary = ellipsize(summary.lines().next().unwrap_or(""), SUMMARY_WIDTH);
                let line = if success {
                    format!("  {} {}: {}", "✓".green(), tool, summary.dimmed())
                } else {
                    format!("  {} {}: {}", "✗".red(), tool, summary.red())
                };
                self.write_line(state, &line);
            }
            ChatEvent::Complete {
                content,
                tool_usage,
            } => {
                Self::stop_spinner(state);
                if state.reply.trim() != content.trim() {
                    self.end_line(state);
                    self.write(state, &content);
                }
                self.end_line(state);
                if !tool_usage.is_empty() {
                    let noun = if tool_usage.len() == 1 { "call" } else { "calls" };
                    self.write_line(
                        state,
                        &format!("{}", format!("({} tool {noun})", tool_usage.len()).dimmed()),
                    );
                }
            }
            ChatEvent::Error { message } => {
                Self::stop_spinner(state);
                self.write_line(state, &format!("{} {}", "Error:".red().bold(), message));
            }
        }
    }
}

impl Default for ConsoleEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatEventSink for ConsoleEventSink {
    fn emit(&self, event: ChatEvent) {
        let mut state = self.state.lock();
        self.render(&mut state, event);
    }
}
