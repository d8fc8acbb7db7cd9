use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;

use crate::connector::types::{ChannelVariant, ConnectorConfig, EndpointUrl};

pub const VOICE_PATH_SEGMENT: &str = "ivr";
pub const ANALYTICS_QUERY_SUFFIX: &str = "findIntent?fetchConfiguredTasks=false";

static CHANNEL_HOOK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<root>.+?)/chatbot/hooks/(?P<bot>[^/?#]+)")
        .expect("channel hook pattern must compile")
});

pub fn detect_variant(endpoint: &str) -> ChannelVariant {
    let is_voice = match Url::parse(endpoint) {
        Ok(url) => url
            .path_segments()
            .is_some_and(|mut segments| segments.any(|segment| segment == VOICE_PATH_SEGMENT)),
        Err(_) => endpoint.contains(&format!("/{}/", VOICE_PATH_SEGMENT)),
    };

    if is_voice {
        ChannelVariant::Voice
    } else {
        ChannelVariant::Standard
    }
}

/// Rewrites `<root>/chatbot/hooks/<botId>[/hookInstance/...]` into the public
/// findIntent endpoint of the same bot.
pub fn derive_analytics_url(endpoint: &str) -> Option<EndpointUrl> {
    let captures = CHANNEL_HOOK_PATTERN.captures(endpoint)?;
    let root = captures.name("root")?.as_str();
    let bot_id = captures.name("bot")?.as_str();

    Some(format!(
        "{}/api/public/bot/{}/{}",
        root, bot_id, ANALYTICS_QUERY_SUFFIX
    ))
}

pub fn resolve_analytics_url(
    config: &ConnectorConfig,
    variant: ChannelVariant,
) -> Option<EndpointUrl> {
    if !config.nlp_analytics.enabled {
        return None;
    }

    if variant == ChannelVariant::Voice {
        tracing::debug!(
            target: "connector",
            endpoint = %config.webhook_url,
            "nlp_analytics_skipped_for_voice_channel"
        );
        return None;
    }

    if let Some(url) = config
        .nlp_analytics
        .url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
    {
        return Some(url.to_string());
    }

    let derived = derive_analytics_url(&config.webhook_url);
    if derived.is_none() {
        tracing::warn!(
            target: "connector",
            endpoint = %config.webhook_url,
            "nlp_analytics_disabled_unrecognized_webhook_url"
        );
    }
    derived
}
