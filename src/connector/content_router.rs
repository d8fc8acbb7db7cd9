use serde_json::Value;

use crate::connector::{
    http_common::media_type,
    response_normalizer::ResponseNormalizer,
    types::{CanonicalMessage, NlpResult, RawResponse},
    voice_markup::VoiceMarkupDecoder,
};

const VOICE_MARKUP_TYPES: [&str; 3] = ["application/voicexml+xml", "text/xml", "application/xml"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRoute {
    Json,
    VoiceMarkup,
    PlainText,
}

impl ContentRoute {
    pub fn classify(content_type: Option<&str>) -> Self {
        let Some(media_type) = media_type(content_type) else {
            return Self::PlainText;
        };

        if media_type == "application/json" || media_type.ends_with("+json") {
            Self::Json
        } else if VOICE_MARKUP_TYPES.contains(&media_type.as_str()) {
            Self::VoiceMarkup
        } else {
            Self::PlainText
        }
    }
}

/// Picks the decoder for a channel reply by its content type.
#[derive(Default, Clone, Copy)]
pub struct ContentRouter {
    normalizer: ResponseNormalizer,
    voice: VoiceMarkupDecoder,
}

impl ContentRouter {
    pub fn route(&self, primary: &RawResponse, nlp: Option<NlpResult>) -> Vec<CanonicalMessage> {
        if primary.body.is_empty() {
            tracing::debug!(
                target: "connector",
                status = primary.status,
                "channel_response_empty"
            );
            return Vec::new();
        }

        let route = ContentRoute::classify(primary.content_type.as_deref());
        tracing::debug!(target: "connector", route = ?route, "channel_response_routed");

        match route {
            ContentRoute::Json => match serde_json::from_str::<Value>(&primary.body) {
                Ok(body) => self.normalizer.normalize(&body, nlp),
                Err(err) => {
                    tracing::warn!(
                        target: "connector",
                        error = %err,
                        "channel_response_json_invalid_falling_back_to_text"
                    );
                    self.normalizer.plain_text(&primary.body)
                }
            },
            // Voice replies never carry analytics or forms.
            ContentRoute::VoiceMarkup => self.voice.to_messages(&primary.body),
            ContentRoute::PlainText => self.normalizer.plain_text(&primary.body),
        }
    }
}
