//! Discord webhook notification channel.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::events::CardEvent;
use crate::NotifyChannel;

/// Maximum characters of a card description shown in an embed.
pub const MAX_DESCRIPTION_CHARS: usize = 1024;

/// Discord's limit for embed titles.
const MAX_TITLE_CHARS: usize = 256;

/// Discord's limit for embed field values.
const MAX_FIELD_CHARS: usize = 1024;

/// Discord's limit for embed footer text.
const MAX_FOOTER_CHARS: usize = 2048;

/// Discord's limit for all text in one embed combined.
const MAX_EMBED_CHARS: usize = 6000;

/// Fallback wait when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Upper bound on the wait a 429 can ask for.
pub const MAX_RETRY_AFTER_SECS: u64 = 300;

/// Discord webhook notification channel.
pub struct DiscordChannel {
    webhook_url: String,
    thread_id: Option<String>,
    client: reqwest::Client,
}

impl DiscordChannel {
    /// Create a Discord channel for a webhook URL.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChannelError::Config(e.to_string()))?;

        Ok(Self {
            webhook_url: webhook_url.into(),
            thread_id: None,
            client,
        })
    }

    /// Post into a thread of the webhook's channel.
    #[must_use]
    pub fn with_thread_id(mut self, thread_id: Option<String>) -> Self {
        self.thread_id = thread_id.filter(|t| !t.is_empty());
        self
    }

    /// Format an event as a Discord webhook payload.
    fn format_payload(event: &CardEvent) -> DiscordPayload {
        let title = truncate(&event.title, MAX_TITLE_CHARS);
        let description = event
            .description
            .as_deref()
            .map(|d| truncate(d, MAX_DESCRIPTION_CHARS));
        let author = event.change.as_str().to_string();
        let footer = truncate(&event.board, MAX_FOOTER_CHARS);

        let used = [
            title.as_str(),
            author.as_str(),
            footer.as_str(),
            description.as_deref().unwrap_or_default(),
        ]
        .iter()
        .map(|s| s.chars().count())
        .sum::<usize>();
        let fields = fit_fields(Self::format_fields(event), MAX_EMBED_CHARS.saturating_sub(used));

        let embed = DiscordEmbed {
            title,
            url: event.url.clone(),
            description,
            color: event.change.color(),
            timestamp: event.timestamp.to_rfc3339(),
            author: Some(DiscordAuthor { name: author }),
            footer: Some(DiscordFooter { text: footer }),
            fields,
        };

        DiscordPayload {
            embeds: vec![embed],
        }
    }

    /// Format the card attributes as embed fields, skipping empty ones.
    fn format_fields(event: &CardEvent) -> Vec<DiscordField> {
        let mut fields = vec![];

        if let Some(stack) = &event.stack {
            fields.push(DiscordField::inline("Stack", stack));
        }

        if let Some(due) = event.due {
            fields.push(DiscordField::inline("Due", due.format("%Y-%m-%d").to_string()));
        }

        if !event.assignees.is_empty() {
            let users: Vec<String> = event.assignees.iter().map(|u| format!("@{u}")).collect();
            fields.push(DiscordField::inline("Assigned", users.join(", ")));
        }

        if !event.labels.is_empty() {
            let labels: Vec<String> = event.labels.iter().map(|l| format!("[{l}]")).collect();
            fields.push(DiscordField::inline("Labels", labels.join(" ")));
        }

        if !event.changed_fields.is_empty() {
            fields.push(DiscordField {
                name: "Changed".to_string(),
                value: truncate(&event.changed_fields.join(", "), MAX_FIELD_CHARS),
                inline: false,
            });
        }

        fields
    }
}

#[async_trait]
impl NotifyChannel for DiscordChannel {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn send(&self, event: &CardEvent) -> Result<(), ChannelError> {
        let payload = Self::format_payload(event);

        debug!(channel = "discord", card_id = event.card_id, event = %event.summary(), "Sending notification");

        let mut request = self.client.post(&self.webhook_url).json(&payload);
        if let Some(thread_id) = &self.thread_id {
            request = request.query(&[("thread_id", thread_id)]);
        }

        let response = request.send().await?;

        if response.status().is_success() {
            debug!(channel = "discord", "Notification sent successfully");
            Ok(())
        } else if response.status() == 429 {
            // Rate limited
            let retry_after = parse_retry_after(
                response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok()),
            );

            warn!(
                channel = "discord",
                retry_after_secs = retry_after,
                "Rate limited by Discord"
            );

            Err(ChannelError::RateLimited {
                retry_after_secs: retry_after,
            })
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            warn!(
                channel = "discord",
                status = %status,
                body = %body,
                "Discord webhook request failed"
            );

            Err(ChannelError::Status {
                service: "Discord",
                status: status.as_u16(),
                body,
            })
        }
    }
}

// =============================================================================
// Discord API types
// =============================================================================

#[derive(Debug, Serialize)]
struct DiscordPayload {
    embeds: Vec<DiscordEmbed>,
}

#[derive(Debug, Serialize)]
struct DiscordEmbed {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    color: u32,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<DiscordAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<DiscordFooter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<DiscordField>,
}

#[derive(Debug, Serialize)]
struct DiscordAuthor {
    name: String,
}

#[derive(Debug, Serialize)]
struct DiscordFooter {
    text: String,
}

#[derive(Debug, Serialize)]
struct DiscordField {
    name: String,
    value: String,
    inline: bool,
}

impl DiscordField {
    fn inline(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: truncate(&value.into(), MAX_FIELD_CHARS),
            inline: true,
        }
    }
}

/// Keep fields in order while they fit in `budget` characters. The field that
/// crosses the budget is shortened and the rest are dropped.
fn fit_fields(fields: Vec<DiscordField>, mut budget: usize) -> Vec<DiscordField> {
    let mut fitted = Vec::with_capacity(fields.len());
    for mut field in fields {
        let name_len = field.name.chars().count();
        let len = name_len + field.value.chars().count();
        if len <= budget {
            budget -= len;
            fitted.push(field);
            continue;
        }
        if budget > name_len + 1 {
            field.value = truncate(&field.value, budget - name_len);
            fitted.push(field);
        }
        break;
    }
    fitted
}

/// Seconds to wait from a `Retry-After` value, rounded up and bounded by
/// [`MAX_RETRY_AFTER_SECS`].
fn parse_retry_after(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map_or(DEFAULT_RETRY_AFTER_SECS, |secs| {
            (secs.ceil() as u64).min(MAX_RETRY_AFTER_SECS)
        })
}

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
