use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use crate::connector::{
    content_router::ContentRouter,
    credentials::{
        ClientCredentials, Hs256TokenIssuer, TokenIssuer, issue_admin_token, issue_session_token,
    },
    dispatcher::{Dispatcher, HttpTransport, ReqwestTransport},
    endpoints::{detect_variant, resolve_analytics_url},
    error::{ConnectorError, configuration_error},
    http_common::redact_endpoint,
    nlp::{extract_nlp, parse_analytics_body},
    request_builder::{ChannelTarget, RequestBuilder},
    sink::DeliverySink,
    types::{ConnectorConfig, ConnectorSession, OutboundTurn},
};

/// Session-level entry point: owns configuration and collaborators, while all
/// per-conversation state lives in the caller's `ConnectorSession`.
pub struct Connector {
    config: ConnectorConfig,
    token_issuer: Arc<dyn TokenIssuer>,
    request_builder: RequestBuilder,
    dispatcher: Dispatcher,
    router: ContentRouter,
    sink: Arc<dyn DeliverySink>,
}

impl Connector {
    pub fn new(
        config: ConnectorConfig,
        sink: Arc<dyn DeliverySink>,
    ) -> Result<Self, ConnectorError> {
        validate_config(&config)?;
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new()?);

        Ok(Self {
            config,
            token_issuer: Arc::new(Hs256TokenIssuer),
            request_builder: RequestBuilder,
            dispatcher: Dispatcher::new(transport),
            router: ContentRouter::default(),
            sink,
        })
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.dispatcher = Dispatcher::new(transport);
        self
    }

    pub fn with_token_issuer(mut self, token_issuer: Arc<dyn TokenIssuer>) -> Self {
        self.token_issuer = token_issuer;
        self
    }

    pub async fn start_session(&self) -> Result<ConnectorSession, ConnectorError> {
        let from_id = configured_or_generated(self.config.from_id.as_deref());
        let to_id = configured_or_generated(self.config.to_id.as_deref());

        let token = issue_session_token(
            self.token_issuer.as_ref(),
            &ClientCredentials::session(&self.config),
            &from_id,
        )?;
        let admin_token = issue_admin_token(
            self.token_issuer.as_ref(),
            ClientCredentials::admin(&self.config).as_ref(),
            &from_id,
        )?;

        let variant = detect_variant(&self.config.webhook_url);
        let analytics_url = resolve_analytics_url(&self.config, variant);

        let mut session = ConnectorSession {
            endpoint: Some(self.config.webhook_url.clone()),
            variant,
            token: Some(token),
            admin_token,
            from_id: Some(from_id),
            to_id: Some(to_id),
            analytics_url,
            bot_name: self.config.bot_name.clone(),
            parent_intent: None,
        };

        tracing::info!(
            target: "connector",
            endpoint = %redact_endpoint(&self.config.webhook_url),
            variant = ?session.variant,
            analytics = session.analytics_url.is_some(),
            admin_token = session.admin_token.is_some(),
            "session_started"
        );

        if self.config.welcome.is_some() {
            self.send_welcome(&mut session).await?;
        }

        Ok(session)
    }

    pub async fn send_turn(
        &self,
        session: &mut ConnectorSession,
        turn: OutboundTurn,
    ) -> Result<(), ConnectorError> {
        let endpoint = session.endpoint.clone().unwrap_or_default();
        let target = ChannelTarget {
            endpoint: &endpoint,
            variant: session.variant,
        };
        self.run_turn(&target, session, turn).await
    }

    /// Sends the configured welcome text with analytics suppressed, to the
    /// welcome endpoint when one is configured.
    pub async fn send_welcome(&self, session: &mut ConnectorSession) -> Result<(), ConnectorError> {
        let Some(welcome) = self.config.welcome.as_ref() else {
            return Ok(());
        };

        let endpoint = welcome
            .url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .map(str::to_string)
            .or_else(|| session.endpoint.clone())
            .unwrap_or_default();
        let target = ChannelTarget {
            endpoint: &endpoint,
            variant: detect_variant(&endpoint),
        };

        tracing::debug!(
            target: "connector",
            endpoint = %redact_endpoint(&endpoint),
            "welcome_sending"
        );
        self.run_turn(
            &target,
            session,
            OutboundTurn::new(welcome.text.clone()).without_analytics(),
        )
        .await
    }

    pub fn stop_session(&self, session: &mut ConnectorSession) {
        session.clear();
        tracing::info!(target: "connector", "session_stopped");
    }

    async fn run_turn(
        &self,
        target: &ChannelTarget<'_>,
        session: &mut ConnectorSession,
        turn: OutboundTurn,
    ) -> Result<(), ConnectorError> {
        let requests = self
            .request_builder
            .build(target, session, &self.config.ivr, &turn)?;
        let deadline = self.turn_deadline(&turn);

        let outcome = self.dispatcher.dispatch(&requests, deadline).await?;

        let nlp = match outcome.analytics.as_ref().and_then(parse_analytics_body) {
            Some(body) => {
                let extraction = extract_nlp(&body);
                if let Some(intent) = extraction.winning_intent {
                    session.parent_intent = Some(intent);
                }
                extraction.nlp
            }
            None => None,
        };

        let messages = self.router.route(&outcome.primary, nlp);
        tracing::debug!(
            target: "connector",
            status = outcome.primary.status,
            messages = messages.len(),
            parent_intent = session.parent_intent.as_deref().unwrap_or("-"),
            "turn_completed"
        );

        for message in messages {
            self.sink.deliver(message);
        }
        Ok(())
    }

    fn turn_deadline(&self, turn: &OutboundTurn) -> Duration {
        turn.timeout.unwrap_or_else(|| self.config.turn_timeout())
    }
}

fn validate_config(config: &ConnectorConfig) -> Result<(), ConnectorError> {
    if config.webhook_url.trim().is_empty() {
        return Err(configuration_error("webhook_url is required"));
    }
    if config.client_id.trim().is_empty() {
        return Err(configuration_error("client_id is required"));
    }
    if config.client_secret.is_empty() {
        return Err(configuration_error("client_secret is required"));
    }
    if config.nlp_analytics.enabled
        && config
            .bot_name
            .as_deref()
            .is_none_or(|name| name.trim().is_empty())
    {
        return Err(configuration_error(
            "bot_name is required when nlp_analytics is enabled",
        ));
    }
    if config.timeout_ms == 0 {
        return Err(configuration_error("timeout_ms must be greater than zero"));
    }
    Ok(())
}

fn configured_or_generated(configured: Option<&str>) -> String {
    configured
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
