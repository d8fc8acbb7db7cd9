use serde_json::Value;

use crate::connector::{
    forms::extract_forms,
    segments::DecodedContent,
    types::{CanonicalMessage, FormField, NlpResult},
};

/// Stateless JSON decode pipeline: NLP and form data are attached once per turn,
/// to the first message that is emitted.
#[derive(Default, Clone, Copy)]
pub struct ResponseNormalizer;

impl ResponseNormalizer {
    pub fn normalize(&self, body: &Value, nlp: Option<NlpResult>) -> Vec<CanonicalMessage> {
        let mut pending = PendingTurnData {
            nlp: nlp.filter(|nlp| !nlp.is_empty()),
            forms: extract_forms(body),
        };

        let mut messages = Vec::new();
        for segment in Self::text_segments(body) {
            let parts = DecodedContent::decode(&segment).into_parts();
            if parts.is_empty() {
                continue;
            }

            let mut message = CanonicalMessage::new(body.clone());
            message.message_text = parts.message_text;
            message.buttons = parts.buttons;
            message.media = parts.media;
            message.cards = parts.cards;
            pending.attach_to(&mut message);
            messages.push(message);
        }

        if pending.is_pending() {
            let mut message = CanonicalMessage::new(body.clone());
            pending.attach_to(&mut message);
            messages.push(message);
        }

        tracing::debug!(
            target: "connector",
            messages = messages.len(),
            "json_response_normalized"
        );
        messages
    }

    /// Non-JSON bodies: one message whose text is the body verbatim.
    pub fn plain_text(&self, raw: &str) -> Vec<CanonicalMessage> {
        if raw.is_empty() {
            return Vec::new();
        }
        vec![CanonicalMessage::text(
            Value::String(raw.to_string()),
            raw,
        )]
    }

    pub fn text_segments(body: &Value) -> Vec<String> {
        let segments = match body.get("text") {
            Some(Value::Array(items)) => items.iter().collect::<Vec<_>>(),
            Some(single) => vec![single],
            None => Vec::new(),
        };

        segments
            .into_iter()
            .filter(|segment| is_truthy(segment))
            .map(|segment| match segment {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect()
    }
}

struct PendingTurnData {
    nlp: Option<NlpResult>,
    forms: Vec<FormField>,
}

impl PendingTurnData {
    fn is_pending(&self) -> bool {
        self.nlp.is_some() || !self.forms.is_empty()
    }

    fn attach_to(&mut self, message: &mut CanonicalMessage) {
        message.nlp = self.nlp.take();
        message.forms = std::mem::take(&mut self.forms);
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
