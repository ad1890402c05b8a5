//! Command table between the messaging layer and the query service
//!
//! Commands are registered by name up front; dispatch is a map lookup.
//! Every dispatched command is logged with its timing and result count.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

use crate::common::types::{CardResult, PriceStatus};
use crate::faq::{FaqEntry, FaqRepository};
use crate::query::CardQueryService;

/// Most FAQ entries shown for one question
const MAX_FAQ_RESULTS: usize = 5;

/// Plain-text reply rendered by the messaging layer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandResponse {
    pub lines: Vec<String>,
    /// Number of matched records behind the reply
    pub results: usize,
}

impl CommandResponse {
    /// A single line reporting no results
    pub fn text(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            results: 0,
        }
    }

    /// One line per matched record
    pub fn listing(lines: Vec<String>) -> Self {
        let results = lines.len();
        Self { lines, results }
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

/// A named bot command
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name as typed by users
    fn name(&self) -> &'static str;

    /// One-line help text
    fn description(&self) -> &'static str;

    /// Handle the command's argument text
    async fn handle(&self, args: &str) -> CommandResponse;
}

/// Format one query result as a single line
pub fn render_result(result: &CardResult) -> String {
    let card = &result.card;
    let price = match &result.price {
        PriceStatus::Available(snapshot) if result.stale => format!("{} (stale)", snapshot),
        PriceStatus::Available(snapshot) => snapshot.to_string(),
        PriceStatus::Unavailable => "price unavailable".to_string(),
    };
    format!("{} ({}) - {}: {}", card.name, card.set, card.card_type, price)
}

fn no_match(args: &str) -> CommandResponse {
    CommandResponse::text(format!("No cards found for '{}'.", args.trim()))
}

/// `/card <name>`: catalog matches with prices
pub struct CardCommand {
    service: CardQueryService,
}

impl CardCommand {
    pub fn new(service: CardQueryService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl CommandHandler for CardCommand {
    fn name(&self) -> &'static str {
        "card"
    }

    fn description(&self) -> &'static str {
        "Look up cards by name"
    }

    async fn handle(&self, args: &str) -> CommandResponse {
        let results = self.service.query(args).await;
        if results.is_empty() {
            return no_match(args);
        }
        CommandResponse::listing(results.iter().map(render_result).collect())
    }
}

/// `/price <name>`: priced matches first, cheapest to most expensive
pub struct PriceCommand {
    service: CardQueryService,
}

impl PriceCommand {
    pub fn new(service: CardQueryService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl CommandHandler for PriceCommand {
    fn name(&self) -> &'static str {
        "price"
    }

    fn description(&self) -> &'static str {
        "Show market prices for matching cards"
    }

    async fn handle(&self, args: &str) -> CommandResponse {
        let mut results = self.service.query(args).await;
        if results.is_empty() {
            return no_match(args);
        }

        // Stable sort keeps relevance order among equal prices and unpriced cards
        results.sort_by(|a, b| match (a.price.snapshot(), b.price.snapshot()) {
            (Some(x), Some(y)) => x.value.cmp(&y.value),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        CommandResponse::listing(results.iter().map(render_result).collect())
    }
}

fn render_faq(entry: &FaqEntry) -> String {
    format!("{}: {}", entry.topic, entry.answer)
}

/// `/faq [topic]`: rules answers, or the topic list without arguments
pub struct FaqCommand {
    faq: Arc<FaqRepository>,
}

impl FaqCommand {
    pub fn new(faq: Arc<FaqRepository>) -> Self {
        Self { faq }
    }
}

#[async_trait]
impl CommandHandler for FaqCommand {
    fn name(&self) -> &'static str {
        "faq"
    }

    fn description(&self) -> &'static str {
        "Answer common rules questions"
    }

    async fn handle(&self, args: &str) -> CommandResponse {
        if args.trim().is_empty() {
            if self.faq.is_empty() {
                return CommandResponse::text("No FAQ entries are loaded.");
            }
            return CommandResponse {
                lines: vec![format!("FAQ topics: {}", self.faq.topics().join(", "))],
                results: self.faq.len(),
            };
        }

        let entries = self.faq.lookup(args, MAX_FAQ_RESULTS);
        if entries.is_empty() {
            return CommandResponse::text(format!(
                "No FAQ entry for '{}'. Try /faq for the topic list.",
                args.trim()
            ));
        }
        CommandResponse::listing(entries.into_iter().map(render_faq).collect())
    }
}

/// Timing and outcome of one dispatched command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLog {
    pub command: String,
    pub args: String,
    pub elapsed: Duration,
    pub results: usize,
}

impl CommandLog {
    fn emit(&self) {
        info!(
            command = %self.command,
            args = %self.args,
            elapsed_ms = self.elapsed.as_millis() as u64,
            results = self.results,
            "Command handled"
        );
    }
}

/// Explicit command-name to handler table
#[derive(Default, Clone)]
pub struct CommandRouter {
    handlers: BTreeMap<String, Arc<dyn CommandHandler>>,
}

impl CommandRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with the built-in `card` and `price` commands
    pub fn with_defaults(service: CardQueryService) -> Self {
        let mut router = Self::new();
        router.register(Arc::new(CardCommand::new(service.clone())));
        router.register(Arc::new(PriceCommand::new(service)));
        router
    }

    /// Add or replace a handler under its own name
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) {
        debug!("Registering command /{}", handler.name());
        self.handlers.insert(handler.name().to_string(), handler);
    }

    /// Registered command names, sorted
    pub fn commands(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// Help listing for every registered command
    pub fn help(&self) -> CommandResponse {
        let mut lines: Vec<String> = self
            .handlers
            .values()
            .map(|h| format!("/{} - {}", h.name(), h.description()))
            .collect();
        lines.push("/help - List available commands".to_string());
        CommandResponse::listing(lines)
    }

    /// Run a command; `None` if no handler has that name
    #[instrument(skip(self))]
    pub async fn dispatch(&self, name: &str, args: &str) -> Option<CommandResponse> {
        let (response, log) = self.dispatch_logged(name, args).await?;
        log.emit();
        Some(response)
    }

    /// Run a command and report what it did, without logging
    pub async fn dispatch_logged(
        &self,
        name: &str,
        args: &str,
    ) -> Option<(CommandResponse, CommandLog)> {
        let name = name.trim().trim_start_matches('/').to_lowercase();
        let started = Instant::now();

        let response = if name == "help" {
            self.help()
        } else {
            self.handlers.get(&name)?.handle(args).await
        };

        let log = CommandLog {
            command: name,
            args: args.to_string(),
            elapsed: started.elapsed(),
            results: response.results,
        };
        Some((response, log))
    }

    /// Parse `/command args` (bare text means `card`) and dispatch it
    pub async fn dispatch_line(&self, line: &str) -> Option<CommandResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match line.strip_prefix('/') {
            Some(rest) => {
                let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                self.dispatch(name, args.trim()).await
            }
            None => self.dispatch("card", line).await,
        }
    }
}
