//! `email` tool.
//!
//! Sends mail through an HTTP mail relay (`POST {relay_url}` with a JSON
//! message and bearer auth), renders templates loaded from a directory of
//! `.html`/`.txt` files and keeps the most recent drafts in memory. Results are never cached.
//!
//! | Action | Required arguments |
//! |--------|--------------------|
//! | `send_email` | `to` |
//! | `send_template_email` | `template_name`, `to`, `subject` |
//! | `get_template` | `template_name` |
//! | `save_draft` | `draft_id`, `draft_data` |

use super::http::{TOOL_HTTP_TIMEOUT, check_response, http_client, transport_error};
use async_trait::async_trait;
use chrono::NaiveDate;
use deepseek_domain::{
    Clock, ParamType, SystemClock, Tool, ToolError, ToolInvocation, ToolParameter, ToolSpec,
};
use parking_lot::Mutex;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

/// Canonical tool name for the email tool.
pub const EMAIL: &str = "email";

pub const EMAIL_RELAY_KEY_ENV: &str = "EMAIL_RELAY_API_KEY";
pub const DEFAULT_DAILY_LIMIT: u32 = 50;

/// Drafts kept in memory; saving beyond this drops the oldest.
pub const MAX_DRAFTS: usize = 100;

const ACTIONS: [&str; 4] = ["send_email", "send_template_email", "get_template", "save_draft"];

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok());

pub fn is_valid_email(address: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(address))
}

fn is_empty_list(list: &&[String]) -> bool {
    list.is_empty()
}

fn parse_address_list(list: Option<&str>) -> Vec<String> {
    list.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Replace every `{{key}}` with the variable's value. Strings are inserted
/// without quotes; other JSON values use their compact form.
pub fn render_template(template: &str, vars: &Map<String, Value>) -> String {
    vars.iter().fold(template.to_string(), |body, (key, value)| {
        let replacement = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        body.replace(&format!("{{{{{key}}}}}"), &replacement)
    })
}

/// Read `*.html` and `*.txt` files under `dir`, keyed by file stem.
fn load_templates(dir: &Path) -> BTreeMap<String, String> {
    let mut templates = BTreeMap::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Email template directory not readable");
            return templates;
        }
    };
    for path in entries.flatten().map(|entry| entry.path()) {
        let is_template = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "html" || e == "txt");
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !is_template {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(body) => {
                templates.insert(name.to_string(), body);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to read email template"),
        }
    }
    info!(count = templates.len(), dir = %dir.display(), "Loaded email templates");
    templates
}

/// Resolved configuration for [`EmailTool`].
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Endpoint accepting a JSON message per POST
    pub relay_url: Option<String>,
    pub api_key: Option<String>,
    pub sender: Option<String>,
    pub template_dir: Option<PathBuf>,
    pub daily_limit: u32,
    /// Validate and report, but never contact the relay
    pub dry_run: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            relay_url: None,
            api_key: None,
            sender: None,
            template_dir: None,
            daily_limit: DEFAULT_DAILY_LIMIT,
            dry_run: false,
        }
    }
}

/// Message body POSTed to the relay.
#[derive(Debug, Serialize)]
struct OutgoingEmail<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a str>,
    to: &'a [String],
    #[serde(skip_serializing_if = "is_empty_list")]
    cc: &'a [String],
    #[serde(skip_serializing_if = "is_empty_list")]
    bcc: &'a [String],
    subject: &'a str,
    body: &'a str,
    content_type: &'static str,
}

struct Outgoing {
    to: Vec<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
    subject: String,
    body: String,
    is_html: bool,
}

/// In-memory drafts in save order
#[derive(Debug, Default)]
struct Drafts {
    by_id: HashMap<String, Value>,
    order: VecDeque<String>,
}

impl Drafts {
    fn save(&mut self, id: &str, data: Value) {
        if self.by_id.insert(id.to_string(), data).is_some() {
            self.order.retain(|existing| existing != id);
        }
        self.order.push_back(id.to_string());
        while self.order.len() > MAX_DRAFTS {
            if let Some(oldest) = self.order.pop_front() {
                self.by_id.remove(&oldest);
                debug!(draft_id = %oldest, "Dropped oldest email draft");
            }
        }
    }
}

#[derive(Debug)]
struct SendCounter {
    day: NaiveDate,
    sent: u32,
}

/// Email sending, templates and drafts
pub struct EmailTool {
    spec: ToolSpec,
    config: EmailConfig,
    http: reqwest::Client,
    templates: BTreeMap<String, String>,
    drafts: Mutex<Drafts>,
    counter: Mutex<SendCounter>,
    clock: Arc<dyn Clock>,
}

impl EmailTool {
    pub fn new(config: EmailConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: EmailConfig, clock: Arc<dyn Clock>) -> Self {
        let templates = config
            .template_dir
            .as_deref()
            .map(load_templates)
            .unwrap_or_default();
        let today = clock.now().date_naive();
        Self {
            spec: email_spec(),
            http: http_client(TOOL_HTTP_TIMEOUT),
            templates,
            drafts: Mutex::new(Drafts::default()),
            counter: Mutex::new(SendCounter { day: today, sent: 0 }),
            clock,
            config,
        }
    }

    pub fn template_names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    pub fn draft(&self, draft_id: &str) -> Option<Value> {
        self.drafts.lock().by_id.get(draft_id).cloned()
    }

    fn template(&self, name: &str) -> Result<&str, ToolError> {
        self.templates.get(name).map(String::as_str).ok_or_else(|| {
            let available = self.template_names();
            ToolError::execution_failed(format!(
                "Template '{name}' not found (available: {})",
                if available.is_empty() {
                    "none".to_string()
                } else {
                    available.join(", ")
                }
            ))
        })
    }

    /// Reserve one send against the daily limit. Resets when the date changes.
    fn reserve_send(&self) -> Result<(), ToolError> {
        let today = self.clock.now().date_naive();
        let mut counter = self.counter.lock();
        if counter.day != today {
            counter.day = today;
            counter.sent = 0;
        }
        if counter.sent >= self.config.daily_limit {
            return Err(ToolError::rate_limited("Daily email limit reached"));
        }
        counter.sent += 1;
        Ok(())
    }

    fn release_send(&self) {
        let mut counter = self.counter.lock();
        counter.sent = counter.sent.saturating_sub(1);
    }

    async fn send(&self, mail: Outgoing) -> Result<Value, ToolError> {
        let recipients: Vec<String> = mail
            .to
            .iter()
            .chain(&mail.cc)
            .chain(&mail.bcc)
            .cloned()
            .collect();
        if mail.to.is_empty() {
            return Err(ToolError::validation("No valid recipients specified"));
        }
        if let Some(bad) = recipients.iter().find(|a| !is_valid_email(a)) {
            return Err(ToolError::validation(format!("Invalid email address: {bad}")));
        }

        if self.config.dry_run {
            info!(recipients = recipients.len(), subject = %mail.subject, "Dry run, email not sent");
            return Ok(json!({
                "status": "success",
                "message": "[DRY RUN] Email would be sent successfully",
                "recipients": recipients,
                "subject": mail.subject,
            }));
        }

        let (Some(relay_url), Some(api_key)) =
            (self.config.relay_url.as_deref(), self.config.api_key.as_deref())
        else {
            return Err(ToolError::not_configured(format!(
                "Email relay not configured; set tools.email.relay_url and {EMAIL_RELAY_KEY_ENV}"
            )));
        };

        self.reserve_send()?;
        let message = OutgoingEmail {
            from: self.config.sender.as_deref(),
            to: &mail.to,
            cc: &mail.cc,
            bcc: &mail.bcc,
            subject: &mail.subject,
            body: &mail.body,
            content_type: if mail.is_html { "text/html" } else { "text/plain" },
        };
        info!(recipients = recipients.len(), subject = %mail.subject, "Sending email");

        let sent = async {
            let response = self
                .http
                .post(relay_url)
                .bearer_auth(api_key)
                .json(&message)
                .send()
                .await
                .map_err(|e| transport_error("Email relay", e))?;
            check_response("Email relay", response).await
        }
        .await;
        if let Err(e) = sent {
            self.release_send();
            return Err(e);
        }

        Ok(json!({
            "status": "success",
            "message": "Email sent successfully",
            "recipients": recipients,
            "subject": mail.subject,
        }))
    }

    fn outgoing(call: &ToolInvocation, subject: String, body: String, is_html: bool) -> Outgoing {
        Outgoing {
            to: parse_address_list(call.get_str("to")),
            cc: parse_address_list(call.get_str("cc")),
            bcc: parse_address_list(call.get_str("bcc")),
            subject,
            body,
            is_html,
        }
    }

    fn save_draft(&self, call: &ToolInvocation) -> Result<Value, ToolError> {
        let draft_id = call
            .get_str("draft_id")
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ToolError::validation("Draft ID is required"))?;
        let data = call
            .arguments
            .get("draft_data")
            .filter(|d| d.as_object().is_some_and(|o| !o.is_empty()))
            .ok_or_else(|| ToolError::validation("No draft data provided"))?;

        self.drafts.lock().save(draft_id, data.clone());
        Ok(json!({
            "status": "success",
            "message": format!("Draft '{draft_id}' saved successfully"),
            "draft_id": draft_id,
        }))
    }
}

fn require<'a>(call: &'a ToolInvocation, key: &str, action: &str) -> Result<&'a str, ToolError> {
    call.get_str(key)
        .ok_or_else(|| ToolError::validation(format!("'{key}' is required for {action}")))
}

fn email_spec() -> ToolSpec {
    ToolSpec::new(EMAIL, "Send emails, render email templates and save drafts")
        .with_parameter(
            ToolParameter::required("action", "The email action to perform", ParamType::String)
                .with_allowed_values(ACTIONS),
        )
        .with_parameter(ToolParameter::optional(
            "to",
            "Recipient address(es), comma-separated",
            ParamType::String,
        ))
        .with_parameter(ToolParameter::optional("subject", "Subject line", ParamType::String))
        .with_parameter(ToolParameter::optional("body", "Body content", ParamType::String))
        .with_parameter(ToolParameter::optional(
            "cc",
            "Carbon copy recipients, comma-separated",
            ParamType::String,
        ))
        .with_parameter(ToolParameter::optional(
            "bcc",
            "Blind carbon copy recipients, comma-separated",
            ParamType::String,
        ))
        .with_parameter(ToolParameter::optional(
            "is_html",
            "Whether the body is HTML",
            ParamType::Boolean,
        ))
        .with_parameter(ToolParameter::optional(
            "template_name",
            "Name of the email template",
            ParamType::String,
        ))
        .with_parameter(ToolParameter::optional(
            "template_vars",
            "Values substituted for {{name}} placeholders",
            ParamType::Object,
        ))
        .with_parameter(ToolParameter::optional(
            "draft_id",
            "Identifier for an email draft",
            ParamType::String,
        ))
        .with_parameter(ToolParameter::optional(
            "draft_data",
            "Draft content to store",
            ParamType::Object,
        ))
}

#[async_trait]
impl Tool for EmailTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn run(&self, call: &ToolInvocation) -> Result<Value, ToolError> {
        let action = call.get_str("action").unwrap_or("send_email");
        match action {
            "send_email" => {
                require(call, "to", action)?;
                let mail = Self::outgoing(
                    call,
                    call.get_str("subject").unwrap_or_default().to_string(),
                    call.get_str("body").unwrap_or_default().to_string(),
                    call.get_bool("is_html").unwrap_or(false),
                );
                self.send(mail).await
            }
            "send_template_email" => {
                let name = require(call, "template_name", action)?;
                require(call, "to", action)?;
                let subject = require(call, "subject", action)?;
                let empty = Map::new();
                let vars = call
                    .arguments
                    .get("template_vars")
                    .and_then(Value::as_object)
                    .unwrap_or(&empty);
                let body = render_template(self.template(name)?, vars);
                let mail = Self::outgoing(
                    call,
                    subject.to_string(),
                    body,
                    call.get_bool("is_html").unwrap_or(true),
                );
                self.send(mail).await
            }
            "get_template" => {
                let name = require(call, "template_name", action)?;
                Ok(json!({
                    "status": "success",
                    "template_name": name,
                    "template": self.template(name)?,
                }))
            }
            "save_draft" => self.save_draft(call),
            other => Err(ToolError::validation(format!("Unknown action: {other}"))),
        }
    }

    fn is_configured(&self) -> bool {
        self.config.dry_run || self.has_credentials()
    }

    fn requires_credentials(&self) -> bool {
        true
    }

    fn has_credentials(&self) -> bool {
        self.config.relay_url.is_some() && self.config.api_key.is_some()
    }
}
