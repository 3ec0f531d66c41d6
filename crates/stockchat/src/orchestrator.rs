//! Two-phase conversation protocol
//!
//! A turn proceeds as follows:
//! 1. Send the conversation and the function catalog to the model (policy `auto`)
//! 2. If the model answers directly, that answer ends the turn
//! 3. Otherwise dispatch the requested function
//! 4. A chart ends the turn with the artifact; an indicator value is sent back
//!    to the model as a `function` message and its second reply ends the turn
//!
//! Messages produced during a turn are staged and only committed to the
//! session when the turn completes. Any error leaves the session untouched.

use crate::api::PriceSource;
use crate::catalog::FunctionCatalog;
use crate::chart::ChartArtifact;
use crate::config::ChatConfig;
use crate::dispatch::{DispatchOutcome, Dispatcher, InvocationRequest};
use crate::error::{ChatError, Result};
use crate::session::{ChatSession, ConversationMessage};
use std::sync::Arc;
use stockchat_llm::{
    CompletionRequest, CompletionResponse, FunctionCallPolicy, LLMProvider, Message,
};
use tracing::{debug, info, instrument};

/// Terminal result of one user turn
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Natural-language answer from the model
    Answer(String),
    /// A chart was rendered; no second model turn happened
    Chart(ChartArtifact),
}

/// Drives user turns against a model and the function dispatcher
pub struct ChatOrchestrator {
    provider: Arc<dyn LLMProvider>,
    dispatcher: Dispatcher,
    catalog: FunctionCatalog,
    config: Arc<ChatConfig>,
}

impl ChatOrchestrator {
    /// Orchestrator whose dispatcher is configured from `config`
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        source: Arc<dyn PriceSource>,
        config: ChatConfig,
    ) -> Self {
        let dispatcher = Dispatcher::from_config(source, &config);
        Self::with_dispatcher(provider, dispatcher, config)
    }

    /// Orchestrator using an already built dispatcher
    pub fn with_dispatcher(
        provider: Arc<dyn LLMProvider>,
        dispatcher: Dispatcher,
        config: ChatConfig,
    ) -> Self {
        Self {
            provider,
            dispatcher,
            catalog: FunctionCatalog,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run one user turn to its terminal state
    #[instrument(skip(self, session, user_input), fields(session_id = %session.id))]
    pub async fn handle_user_message(
        &self,
        session: &mut ChatSession,
        user_input: &str,
    ) -> Result<TurnOutcome> {
        let mut turn = vec![ConversationMessage::user(user_input)];

        info!(history = session.len(), "Model turn 1");
        let first = self
            .call_model(conversation(session, &turn), true)
            .await?;

        let Some(call) = first.message.function_call() else {
            let answer = answer_text(&first.message)?;
            info!(answer_length = answer.len(), "Model answered directly");
            turn.push(ConversationMessage::assistant(answer.clone()));
            session.commit(turn);
            return Ok(TurnOutcome::Answer(answer));
        };

        info!(function = %call.name, "Model requested a function");
        debug!(arguments = %call.arguments, "Function arguments");

        let request = InvocationRequest::from_function_call(call)?;
        match self.dispatcher.resolve_and_invoke(&request).await? {
            DispatchOutcome::Chart(artifact) => {
                info!(path = %artifact.path.display(), "Turn ended with chart");
                turn.push(ConversationMessage::chart(&artifact));
                session.commit(turn);
                Ok(TurnOutcome::Chart(artifact))
            }
            DispatchOutcome::Indicator(result) => {
                turn.push(ConversationMessage::function(
                    request.function_name,
                    result.to_string(),
                ));

                info!("Model turn 2");
                let second = self
                    .call_model(conversation(session, &turn), false)
                    .await?;
                let answer = answer_text(&second.message)?;

                turn.push(ConversationMessage::assistant(answer.clone()));
                session.commit(turn);
                Ok(TurnOutcome::Answer(answer))
            }
        }
    }

    async fn call_model(
        &self,
        messages: Vec<Message>,
        with_catalog: bool,
    ) -> Result<CompletionResponse> {
        let mut builder = CompletionRequest::builder(&self.config.model)
            .messages(messages)
            .max_tokens(self.config.max_tokens);

        if let Some(system) = &self.config.system_prompt {
            builder = builder.system(system.clone());
        }
        if let Some(temperature) = self.config.temperature {
            builder = builder.temperature(temperature);
        }
        if with_catalog {
            builder = builder.functions(self.catalog.definitions(), FunctionCallPolicy::Auto);
        }

        let request = builder.build();
        info!(
            provider = self.provider.name(),
            model = %request.model,
            messages = request.messages.len(),
            with_catalog,
            "Sending request to LLM"
        );

        let response = tokio::time::timeout(self.config.request_timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                ChatError::ModelCallFailed(format!(
                    "model call timed out after {:?}",
                    self.config.request_timeout
                ))
            })??;

        info!(
            stop_reason = ?response.stop_reason,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "LLM response received"
        );
        Ok(response)
    }
}

/// Committed history followed by the staged messages of the current turn
fn conversation(session: &ChatSession, staged: &[ConversationMessage]) -> Vec<Message> {
    let mut messages = session.to_llm_messages();
    messages.extend(staged.iter().map(ConversationMessage::to_llm));
    messages
}

fn answer_text(message: &Message) -> Result<String> {
    if let Some(text) = message.text() {
        return Ok(text.to_string());
    }
    match message.function_call() {
        Some(call) => Err(ChatError::ModelCallFailed(format!(
            "unexpected function call `{}` in follow-up turn",
            call.name
        ))),
        None => Err(ChatError::ModelCallFailed(
            "model returned neither content nor a function call".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockPriceSource;
    use crate::series::PriceSeries;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use stockchat_llm::{FunctionCall, LLMError};

    /// Replays canned responses and records every request
    struct ScriptedProvider {
        responses: Mutex<VecDeque<stockchat_llm::Result<CompletionResponse>>>,
        requests: Mutex<Vec<CompletionRequest>>,
        delay: Option<Duration>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<stockchat_llm::Result<CompletionResponse>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn complete(&self, request: CompletionRequest) -> stockchat_llm::Result<CompletionResponse> {
            self.requests.lock().unwrap().push(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LLMError::UnexpectedResponse("script exhausted".to_string())))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn call(name: &str, arguments: &str) -> stockchat_llm::Result<CompletionResponse> {
        Ok(CompletionResponse::from_message(Message::assistant_function_call(
            FunctionCall::new(name, arguments),
        )))
    }

    fn text(content: &str) -> stockchat_llm::Result<CompletionResponse> {
        Ok(CompletionResponse::from_message(Message::assistant(content)))
    }

    fn rising_source() -> MockPriceSource {
        let mut source = MockPriceSource::new();
        source.expect_fetch_daily_closes().returning(|ticker, _| {
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            let closes: Vec<f64> = (0..40).map(|i| 50.0 + f64::from(i)).collect();
            Ok(PriceSeries::from_closes(ticker, start, &closes))
        });
        source
    }

    fn orchestrator(provider: Arc<ScriptedProvider>, config: ChatConfig) -> ChatOrchestrator {
        let dispatcher = Dispatcher::from_config(Arc::new(rising_source()), &config)
            .with_timeout(Duration::from_secs(5));
        ChatOrchestrator::with_dispatcher(provider, dispatcher, config)
    }

    #[tokio::test]
    async fn test_request_shapes_per_phase() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            call("calculate_RSI", r#"{"ticker": "AAPL"}"#),
            text("RSI is 100."),
        ]));
        let config = ChatConfig::builder()
            .system_prompt("You are a stock assistant.")
            .temperature(0.0)
            .build()
            .unwrap();
        let orch = orchestrator(provider.clone(), config);
        let mut session = ChatSession::new();

        let outcome = orch.handle_user_message(&mut session, "RSI of AAPL?").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Answer("RSI is 100.".to_string()));

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);

        let first = &requests[0];
        assert_eq!(first.functions.as_ref().map(Vec::len), Some(6));
        assert_eq!(first.function_call, Some(FunctionCallPolicy::Auto));
        assert_eq!(first.system.as_deref(), Some("You are a stock assistant."));
        assert_eq!(first.temperature, Some(0.0));
        assert_eq!(first.messages.len(), 1);

        let second = &requests[1];
        assert!(second.functions.is_none());
        assert!(second.function_call.is_none());
        assert_eq!(second.messages.len(), 2);
        assert_eq!(second.messages[1].name.as_deref(), Some("calculate_RSI"));
        assert_eq!(second.messages[1].text(), Some("100"));
    }

    #[tokio::test]
    async fn test_history_is_sent_on_later_turns() {
        let provider = Arc::new(ScriptedProvider::new(vec![text("Hello!"), text("Still here.")]));
        let orch = orchestrator(provider.clone(), ChatConfig::default());
        let mut session = ChatSession::new();

        orch.handle_user_message(&mut session, "hi").await.unwrap();
        orch.handle_user_message(&mut session, "you there?").await.unwrap();

        let requests = provider.requests();
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(requests[1].messages[1].text(), Some("Hello!"));
        assert_eq!(session.len(), 4);
    }

    #[tokio::test]
    async fn test_follow_up_function_call_fails_turn() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            call("calculate_RSI", r#"{"ticker": "AAPL"}"#),
            call("calculate_RSI", r#"{"ticker": "AAPL"}"#),
        ]));
        let orch = orchestrator(provider, ChatConfig::default());
        let mut session = ChatSession::new();

        let err = orch.handle_user_message(&mut session, "RSI of AAPL?").await.unwrap_err();
        match err {
            ChatError::ModelCallFailed(msg) => {
                assert!(msg.contains("unexpected function call"), "{msg}");
                assert!(msg.contains("calculate_RSI"), "{msg}");
            }
            other => panic!("Expected ModelCallFailed, got {other:?}"),
        }
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn test_empty_model_response_fails_turn() {
        let empty = CompletionResponse::from_message(Message {
            content: None,
            ..Message::assistant("")
        });
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(empty)]));
        let orch = orchestrator(provider, ChatConfig::default());
        let mut session = ChatSession::new();

        let err = orch.handle_user_message(&mut session, "hi").await.unwrap_err();
        assert!(matches!(err, ChatError::ModelCallFailed(_)));
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn test_second_turn_failure_leaves_session_unchanged() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            call("get_stock_price", r#"{"ticker": "AAPL"}"#),
            Err(LLMError::RateLimitExceeded("slow down".to_string())),
        ]));
        let orch = orchestrator(provider, ChatConfig::default());
        let mut session = ChatSession::from_messages(vec![
            ConversationMessage::user("hi"),
            ConversationMessage::assistant("Hello!"),
        ]);

        let err = orch
            .handle_user_message(&mut session, "price of AAPL?")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::ModelCallFailed(_)));
        assert_eq!(session.len(), 2);
    }

    #[tokio::test]
    async fn test_model_timeout() {
        let mut provider = ScriptedProvider::new(vec![text("too late")]);
        provider.delay = Some(Duration::from_secs(5));
        let config = ChatConfig::builder()
            .request_timeout(Duration::from_millis(20))
            .build()
            .unwrap();
        let orch = orchestrator(Arc::new(provider), config);
        let mut session = ChatSession::new();

        let err = orch.handle_user_message(&mut session, "hi").await.unwrap_err();
        match err {
            ChatError::ModelCallFailed(msg) => assert!(msg.contains("timed out")),
            other => panic!("Expected ModelCallFailed, got {other:?}"),
        }
        assert!(session.is_empty());
    }
}
