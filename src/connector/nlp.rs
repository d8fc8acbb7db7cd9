use serde_json::Value;

use crate::connector::{
    http_common::media_type,
    types::{NlpEntity, NlpIntent, NlpResult, RawResponse},
};

pub const INCOMPREHENSION_INTENT: &str = "None";
pub const FAIL_INTENT_RESULT: &str = "failintent";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NlpExtraction {
    pub nlp: Option<NlpResult>,
    /// Name of the winning intent, recorded as the parent intent of the next turn.
    pub winning_intent: Option<String>,
}

pub fn parse_analytics_body(raw: &RawResponse) -> Option<Value> {
    if raw.body.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(&raw.body) {
        Ok(value) => Some(value),
        Err(err) => {
            let content_type = media_type(raw.content_type.as_deref()).unwrap_or_default();
            tracing::warn!(
                target: "connector",
                content_type = %content_type,
                error = %err,
                "nlp_analytics_body_not_json"
            );
            None
        }
    }
}

pub fn extract_nlp(analytics: &Value) -> NlpExtraction {
    let response = analytics.get("response").unwrap_or(&Value::Null);
    let final_resolver = response.get("finalResolver");

    let winning_intent = final_resolver
        .and_then(|resolver| resolver.get("winningIntent"))
        .and_then(Value::as_array)
        .and_then(|intents| intents.first())
        .and_then(|intent| intent.get("intent"))
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let intent = if let Some(name) = &winning_intent {
        Some(NlpIntent {
            name: name.clone(),
            incomprehension: None,
        })
    } else if response.get("result").and_then(Value::as_str) == Some(FAIL_INTENT_RESULT) {
        Some(NlpIntent {
            name: INCOMPREHENSION_INTENT.to_string(),
            incomprehension: Some(true),
        })
    } else {
        if final_resolver.is_none() {
            let result = response
                .get("result")
                .and_then(|result| result.as_str())
                .unwrap_or("-");
            tracing::debug!(
                target: "connector",
                result = result,
                "nlp_unresolved_unknown_reason"
            );
        }
        None
    };

    let entities = final_resolver
        .and_then(|resolver| resolver.get("entities"))
        .and_then(Value::as_array)
        .map(|entities| entities.iter().filter_map(map_entity).collect::<Vec<_>>())
        .unwrap_or_default();

    let nlp = NlpResult { intent, entities };
    NlpExtraction {
        nlp: (!nlp.is_empty()).then_some(nlp),
        winning_intent,
    }
}

fn map_entity(entity: &Value) -> Option<NlpEntity> {
    let name = entity
        .get("field")
        .or_else(|| entity.get("name"))
        .and_then(Value::as_str)?;

    Some(NlpEntity {
        name: name.to_string(),
        value: entity_value(entity.get("value")),
    })
}

/// Single-element lists collapse to their scalar; longer lists keep their JSON
/// form so nothing is lost.
pub fn entity_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Array(items)) if items.len() == 1 => scalar_to_string(&items[0]),
        Some(list @ Value::Array(_)) => list.to_string(),
        Some(other) => scalar_to_string(other),
    }
}

pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
