use reqwest::Url;
use serde_json::{Value, json};

use crate::connector::{
    error::{ConnectorError, configuration_error, invalid_state},
    types::{
        AnalyticsRequest, ChannelRequest, ChannelVariant, ConnectorSession, IvrOptions,
        OutboundTurn, TurnRequests,
    },
};

/// Where a turn is sent. Normally the session endpoint; welcome sends may
/// target a different URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTarget<'a> {
    pub endpoint: &'a str,
    pub variant: ChannelVariant,
}

#[derive(Default, Clone, Copy)]
pub struct RequestBuilder;

impl RequestBuilder {
    pub fn build(
        &self,
        target: &ChannelTarget<'_>,
        session: &ConnectorSession,
        ivr: &IvrOptions,
        turn: &OutboundTurn,
    ) -> Result<TurnRequests, ConnectorError> {
        let (Some(token), Some(from_id), Some(to_id)) = (
            session.token.as_deref(),
            session.from_id.as_deref(),
            session.to_id.as_deref(),
        ) else {
            return Err(invalid_state("session is not started"));
        };

        match target.variant {
            ChannelVariant::Voice => Ok(TurnRequests {
                channel: Self::voice_request(target.endpoint, token, from_id, to_id, ivr, turn)?,
                analytics: None,
            }),
            ChannelVariant::Standard => Ok(TurnRequests {
                channel: Self::standard_request(target.endpoint, token, from_id, to_id, turn),
                analytics: Self::analytics_request(session, token, turn),
            }),
        }
    }

    fn standard_request(
        endpoint: &str,
        token: &str,
        from_id: &str,
        to_id: &str,
        turn: &OutboundTurn,
    ) -> ChannelRequest {
        ChannelRequest {
            url: endpoint.to_string(),
            headers: vec![
                ("Authorization".to_string(), format!("Bearer {}", token)),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: json!({
                "message": {"text": turn.text},
                "from": {"id": from_id},
                "to": {"id": to_id},
            }),
        }
    }

    fn voice_request(
        endpoint: &str,
        token: &str,
        from_id: &str,
        to_id: &str,
        ivr: &IvrOptions,
        turn: &OutboundTurn,
    ) -> Result<ChannelRequest, ConnectorError> {
        let mut url = Url::parse(endpoint).map_err(|err| {
            configuration_error(format!("webhook url '{}' is not valid: {}", endpoint, err))
        })?;
        url.query_pairs_mut().append_pair("token", token);

        let mut body = serde_json::Map::new();
        body.insert("callId".into(), Value::String(to_id.to_string()));
        body.insert("message".into(), Value::String(turn.text.clone()));
        body.insert("from".into(), Value::String(from_id.to_string()));
        body.insert(
            "ivr_ani".into(),
            Value::String(
                ivr.caller_number
                    .clone()
                    .unwrap_or_else(|| from_id.to_string()),
            ),
        );
        if let Some(line_number) = &ivr.line_number {
            body.insert("ivr_dnis".into(), Value::String(line_number.clone()));
        }
        if let Some(domain) = &ivr.domain {
            body.insert("ivr_domain".into(), Value::String(domain.clone()));
        }

        Ok(ChannelRequest {
            url: url.to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Value::Object(body),
        })
    }

    fn analytics_request(
        session: &ConnectorSession,
        token: &str,
        turn: &OutboundTurn,
    ) -> Option<AnalyticsRequest> {
        let url = session.analytics_url.as_deref()?;
        if turn.suppress_analytics || turn.text.is_empty() {
            return None;
        }

        let mut body = serde_json::Map::new();
        body.insert("input".into(), Value::String(turn.text.clone()));
        body.insert(
            "streamName".into(),
            Value::String(session.bot_name.clone().unwrap_or_default()),
        );
        if let Some(parent_intent) = &session.parent_intent {
            body.insert("parentIntent".into(), Value::String(parent_intent.clone()));
        }

        let auth = session.admin_token.as_deref().unwrap_or(token);
        Some(AnalyticsRequest {
            url: url.to_string(),
            headers: vec![
                ("auth".to_string(), auth.to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: Value::Object(body),
        })
    }
}
