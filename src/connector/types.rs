use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type EndpointUrl = String;
pub const DEFAULT_TURN_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChannelVariant {
    #[default]
    Standard,
    Voice,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NlpAnalyticsConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Used verbatim instead of deriving the findIntent URL from the webhook URL.
    #[serde(default)]
    pub url: Option<EndpointUrl>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct IvrOptions {
    /// Caller number sent as `ivr_ani`; the sender id is used when unset.
    #[serde(default)]
    pub caller_number: Option<String>,
    /// Dialed line sent as `ivr_dnis`.
    #[serde(default)]
    pub line_number: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeConfig {
    pub text: String,
    #[serde(default)]
    pub url: Option<EndpointUrl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    #[serde(default)]
    pub webhook_url: EndpointUrl,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub admin_client_id: Option<String>,
    #[serde(default)]
    pub admin_client_secret: Option<String>,
    #[serde(default)]
    pub from_id: Option<String>,
    #[serde(default)]
    pub to_id: Option<String>,
    #[serde(default)]
    pub nlp_analytics: NlpAnalyticsConfig,
    #[serde(default)]
    pub bot_name: Option<String>,
    #[serde(default)]
    pub ivr: IvrOptions,
    #[serde(default)]
    pub welcome: Option<WelcomeConfig>,
    #[serde(default = "default_turn_timeout_ms")]
    pub timeout_ms: u64,
}

impl ConnectorConfig {
    pub fn new(
        webhook_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            admin_client_id: None,
            admin_client_secret: None,
            from_id: None,
            to_id: None,
            nlp_analytics: NlpAnalyticsConfig::default(),
            bot_name: None,
            ivr: IvrOptions::default(),
            welcome: None,
            timeout_ms: default_turn_timeout_ms(),
        }
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_turn_timeout_ms() -> u64 {
    DEFAULT_TURN_TIMEOUT_MS
}

/// Per-session connector state. Every field is `None` outside of an active
/// session; `stop_session` resets the whole struct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectorSession {
    pub endpoint: Option<EndpointUrl>,
    pub variant: ChannelVariant,
    pub token: Option<String>,
    pub admin_token: Option<String>,
    pub from_id: Option<String>,
    pub to_id: Option<String>,
    pub analytics_url: Option<EndpointUrl>,
    pub bot_name: Option<String>,
    pub parent_intent: Option<String>,
}

impl ConnectorSession {
    pub fn is_active(&self) -> bool {
        self.token.is_some() && self.from_id.is_some() && self.to_id.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundTurn {
    pub text: String,
    pub timeout: Option<Duration>,
    pub suppress_analytics: bool,
}

impl OutboundTurn {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timeout: None,
            suppress_analytics: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn without_analytics(mut self) -> Self {
        self.suppress_analytics = true;
        self
    }
}

pub type HeaderPair = (String, String);

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRequest {
    pub url: EndpointUrl,
    pub headers: Vec<HeaderPair>,
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsRequest {
    pub url: EndpointUrl,
    pub headers: Vec<HeaderPair>,
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnRequests {
    pub channel: ChannelRequest,
    pub analytics: Option<AnalyticsRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub primary: RawResponse,
    pub analytics: Option<RawResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NlpIntent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incomprehension: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NlpEntity {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NlpResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<NlpIntent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<NlpEntity>,
}

impl NlpResult {
    pub fn is_empty(&self) -> bool {
        self.intent.is_none() && self.entities.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl Button {
    pub fn new(text: impl Into<String>, payload: Option<String>) -> Self {
        Self {
            text: text.into(),
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub media_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Card {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Media>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormFieldType {
    Text,
    Number,
    RadioSet,
    ChoiceSet,
    Date,
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FormFieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalMessage {
    pub source_data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<Media>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cards: Vec<Card>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forms: Vec<FormField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nlp: Option<NlpResult>,
}

impl CanonicalMessage {
    pub fn new(source_data: Value) -> Self {
        Self {
            source_data,
            message_text: None,
            buttons: Vec::new(),
            media: Vec::new(),
            cards: Vec::new(),
            forms: Vec::new(),
            nlp: None,
        }
    }

    pub fn text(source_data: Value, message_text: impl Into<String>) -> Self {
        let mut message = Self::new(source_data);
        message.message_text = Some(message_text.into());
        message
    }

    /// Messages without any of these parts must never reach the sink.
    pub fn carries_content(&self) -> bool {
        self.message_text.is_some()
            || !self.buttons.is_empty()
            || !self.media.is_empty()
            || !self.cards.is_empty()
            || !self.forms.is_empty()
            || self.nlp.is_some()
    }
}
