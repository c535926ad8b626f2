//! The orchestrator: one inbound message in, exactly one channel acknowledgment out.

use std::sync::Arc;

use {
    answerline_agents::AnswerGenerator,
    answerline_channels::{AckOutcome, AckResponder, AckTracker, ChannelOutbound},
    answerline_common::types::{ContextItem, ConversationTurn, InboundMessage, Role},
    answerline_config::PipelineConfig,
    answerline_memory::{EmbeddingProvider, Retriever},
    answerline_sessions::ConversationStore,
    tracing::{debug, error, info, warn},
};

use crate::{
    Error, Result,
    background::BackgroundTasks,
    delivery::{DeliveryDecision, is_empty_answer},
    error::{Stage, StageExt},
    guardrails::SafetyFilter,
    reprocess::{Reprocessor, ReprocessingJob},
};

/// External collaborators the pipeline drives, in call order.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn ConversationStore>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub retriever: Arc<dyn Retriever>,
    pub generator: Arc<dyn AnswerGenerator>,
    pub filter: Arc<dyn SafetyFilter>,
    pub outbound: Arc<dyn ChannelOutbound>,
    pub reprocessor: Arc<dyn Reprocessor>,
}

/// Per-request accumulator. Never shared between requests.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    pub retrieved_context: Vec<ContextItem>,
    pub conversation_history: Vec<ConversationTurn>,
    pub raw_answer: String,
    pub filtered_answer: String,
}

impl PipelineContext {
    fn into_job(self, inbound: &InboundMessage) -> ReprocessingJob {
        ReprocessingJob {
            sender_id: inbound.sender_id().to_string(),
            original_text: inbound.text().to_string(),
            context: self.retrieved_context,
            history: self.conversation_history,
            raw_answer: self.raw_answer,
        }
    }
}

pub struct Pipeline {
    collaborators: Collaborators,
    tasks: BackgroundTasks,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(collaborators: Collaborators, tasks: BackgroundTasks, config: PipelineConfig) -> Self {
        Self {
            collaborators,
            tasks,
            config,
        }
    }

    pub fn tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one inbound message.
    ///
    /// Returns once the channel has been acknowledged. Deferred answers may
    /// still be in flight on [`Pipeline::tasks`].
    pub async fn handle<R: AckResponder>(&self, inbound: InboundMessage, ack: &mut AckTracker<R>) {
        info!(
            sender_id = %inbound.sender_id(),
            chars = inbound.text().chars().count(),
            "inbound message"
        );
        if let Err(e) = self.run(&inbound, ack).await {
            self.handle_failure(&inbound, ack, e).await;
        }
    }

    async fn run<R: AckResponder>(
        &self,
        inbound: &InboundMessage,
        ack: &mut AckTracker<R>,
    ) -> Result<()> {
        let c = &self.collaborators;
        let sender_id = inbound.sender_id();
        let text = inbound.text();

        c.store
            .store(sender_id, text, Role::User)
            .await
            .stage(Stage::Persist)?;
        debug!(%sender_id, "stored user message");

        let Some(embedding) = c.embedder.embed(text).await.stage(Stage::Embed)? else {
            warn!(%sender_id, "no embedding produced, acknowledging without an answer");
            ack.acknowledge(AckOutcome::NoEmbedding);
            return Ok(());
        };

        let mut ctx = PipelineContext {
            retrieved_context: c
                .retriever
                .retrieve(&embedding)
                .await
                .stage(Stage::Retrieve)?,
            ..PipelineContext::default()
        };
        debug!(%sender_id, items = ctx.retrieved_context.len(), "retrieved context");

        ctx.conversation_history = c
            .store
            .history(sender_id, self.config.history_limit)
            .await
            .stage(Stage::History)?;
        debug!(%sender_id, turns = ctx.conversation_history.len(), "fetched history");

        ctx.raw_answer = c
            .generator
            .generate(text, &ctx.retrieved_context, &ctx.conversation_history)
            .await
            .stage(Stage::Generate)?;
        debug!(%sender_id, chars = ctx.raw_answer.chars().count(), "generated answer");

        if is_empty_answer(&ctx.raw_answer, &self.config.empty_answer_sentinel) {
            warn!(%sender_id, "generator returned no usable answer");
            c.outbound
                .send_text(sender_id, &self.config.empty_answer_apology)
                .await
                .stage(Stage::Deliver)?;
            ack.acknowledge(AckOutcome::EmptyAnswer);
            return Ok(());
        }

        ctx.filtered_answer = c.filter.filter(&ctx.raw_answer, text);

        match DeliveryDecision::for_answer(&ctx.filtered_answer, self.config.max_answer_chars) {
            DeliveryDecision::Immediate => {
                c.store
                    .store(sender_id, &ctx.filtered_answer, Role::Bot)
                    .await
                    .stage(Stage::StoreAnswer)?;
                c.outbound
                    .send_text(sender_id, &ctx.filtered_answer)
                    .await
                    .stage(Stage::Deliver)?;
                info!(
                    %sender_id,
                    chars = ctx.filtered_answer.chars().count(),
                    "answer delivered"
                );
                ack.acknowledge(AckOutcome::Delivered);
            },
            DeliveryDecision::Deferred => self.defer(inbound, ctx, ack).await,
        }
        Ok(())
    }

    /// Long-answer path: notify, acknowledge, regenerate in the background.
    async fn defer<R: AckResponder>(
        &self,
        inbound: &InboundMessage,
        ctx: PipelineContext,
        ack: &mut AckTracker<R>,
    ) {
        let sender_id = inbound.sender_id();
        info!(
            %sender_id,
            chars = ctx.filtered_answer.chars().count(),
            limit = self.config.max_answer_chars,
            "answer over limit, deferring to background reprocessing"
        );

        // A lost notice must not stop the eventual answer.
        if let Err(e) = self
            .collaborators
            .outbound
            .send_text(sender_id, &self.config.processing_notice)
            .await
        {
            warn!(%sender_id, error = %e, "failed to send processing notice");
        }

        ack.acknowledge(AckOutcome::Deferred);

        let job = ctx.into_job(inbound);
        let reprocessor = Arc::clone(&self.collaborators.reprocessor);
        if let Err(e) = self.tasks.launch("reprocess", sender_id, async move {
            reprocessor.reprocess(job).await
        }) {
            error!(%sender_id, error = %e, "failed to launch answer reprocessing");
        }
    }

    async fn handle_failure<R: AckResponder>(
        &self,
        inbound: &InboundMessage,
        ack: &mut AckTracker<R>,
        err: Error,
    ) {
        let sender_id = inbound.sender_id();
        if let Some(outcome) = ack.outcome() {
            error!(
                %sender_id,
                error = %err,
                %outcome,
                "pipeline failed after the channel was acknowledged"
            );
            return;
        }

        error!(%sender_id, error = %err, "pipeline failed, sending apology");
        if let Err(e) = self
            .collaborators
            .outbound
            .send_text(sender_id, &self.config.failure_apology)
            .await
        {
            warn!(%sender_id, error = %e, "failed to deliver failure apology");
        }
        ack.acknowledge(AckOutcome::Failed);
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::test_support::*,
        rstest::rstest,
        tokio::sync::Notify,
    };

    const SENDER: &str = "whatsapp:+5511999990000";

    struct Harness {
        store: Arc<FakeStore>,
        embedder: Arc<FakeEmbedder>,
        retriever: Arc<FakeRetriever>,
        generator: Arc<FakeGenerator>,
        filter: Arc<CountingFilter>,
        outbound: Arc<RecordingOutbound>,
        reprocessor: Arc<RecordingReprocessor>,
        pipeline: Pipeline,
    }

    impl Harness {
        fn new(answer: &str) -> Self {
            Self::with_reprocessor(answer, RecordingReprocessor::default())
        }

        fn with_reprocessor(answer: &str, reprocessor: RecordingReprocessor) -> Self {
            let store = Arc::new(FakeStore::default());
            let embedder = Arc::new(FakeEmbedder::default());
            let retriever = Arc::new(FakeRetriever::with_items(vec![ContextItem {
                source: "faq.md".into(),
                text: "Atendemos de segunda a sexta.".into(),
                score: 0.9,
            }]));
            let generator = Arc::new(FakeGenerator::answering(answer));
            let filter = Arc::new(CountingFilter::default());
            let outbound = Arc::new(RecordingOutbound::default());
            let reprocessor = Arc::new(reprocessor);
            let pipeline = Pipeline::new(
                Collaborators {
                    store: store.clone(),
                    embedder: embedder.clone(),
                    retriever: retriever.clone(),
                    generator: generator.clone(),
                    filter: filter.clone(),
                    outbound: outbound.clone(),
                    reprocessor: reprocessor.clone(),
                },
                BackgroundTasks::new(),
                PipelineConfig::default(),
            );
            Self {
                store,
                embedder,
                retriever,
                generator,
                filter,
                outbound,
                reprocessor,
                pipeline,
            }
        }

        async fn handle(&self, text: &str) -> AckTracker<RecordingResponder> {
            let mut ack = AckTracker::new(RecordingResponder::default());
            let inbound = InboundMessage::new(SENDER, text).unwrap();
            self.pipeline.handle(inbound, &mut ack).await;
            ack
        }

        fn config(&self) -> &PipelineConfig {
            self.pipeline.config()
        }
    }

    fn responses(ack: AckTracker<RecordingResponder>) -> Vec<AckOutcome> {
        ack.into_inner().sent
    }

    #[tokio::test]
    async fn short_answer_scenario() {
        let answer = "Olá! Atendemos de segunda a sexta, das 8h às 18h!!";
        assert_eq!(answer.chars().count(), 50);
        let h = Harness::new(answer);

        let ack = h.handle("Oi").await;

        let turns = h.store.turns(SENDER).await;
        assert_eq!(turns.len(), 2);
        assert_eq!((turns[0].role, turns[0].content.as_str()), (Role::User, "Oi"));
        assert_eq!((turns[1].role, turns[1].content.as_str()), (Role::Bot, answer));
        assert_eq!(h.outbound.sent(), vec![(SENDER.to_string(), answer.to_string())]);
        assert!(!h.outbound.texts().contains(&h.config().processing_notice));
        assert_eq!(responses(ack), vec![AckOutcome::Delivered]);
        assert!(h.pipeline.tasks().is_empty());
    }

    #[tokio::test]
    async fn filter_sees_raw_answer_and_original_text() {
        let h = Harness::new("resposta");
        h.handle("pergunta").await;
        assert_eq!(
            h.filter.calls.lock().unwrap().clone(),
            vec![("resposta".to_string(), "pergunta".to_string())]
        );
    }

    #[tokio::test]
    async fn missing_embedding_acknowledges_without_answering() {
        let h = Harness::new("nunca usado");
        *h.embedder.behavior.lock().unwrap() = EmbedBehavior::Nothing;

        let ack = h.handle("   ").await;

        assert_eq!(responses(ack), vec![AckOutcome::NoEmbedding]);
        assert_eq!(h.store.turns(SENDER).await.len(), 1);
        assert_eq!(*h.retriever.calls.lock().unwrap(), 0);
        assert_eq!(h.generator.generate_calls(), 0);
        assert!(h.filter.calls.lock().unwrap().is_empty());
        assert!(h.outbound.sent().is_empty());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("No content available")]
    #[tokio::test]
    async fn empty_answers_get_one_apology(#[case] answer: &str) {
        let h = Harness::new(answer);

        let ack = h.handle("Oi").await;

        assert_eq!(h.outbound.texts(), vec![h.config().empty_answer_apology.clone()]);
        assert_eq!(h.store.count(SENDER, Role::Bot).await, 0);
        assert!(h.filter.calls.lock().unwrap().is_empty());
        assert_eq!(responses(ack), vec![AckOutcome::EmptyAnswer]);
    }

    #[tokio::test]
    async fn answer_at_threshold_is_sent_immediately() {
        let answer = "a".repeat(1000);
        let h = Harness::new(&answer);

        let ack = h.handle("Oi").await;

        assert_eq!(h.outbound.texts(), vec![answer]);
        assert_eq!(h.store.count(SENDER, Role::Bot).await, 1);
        assert_eq!(responses(ack), vec![AckOutcome::Delivered]);
    }

    #[tokio::test]
    async fn long_answer_is_deferred_with_snapshot() {
        let gate = Arc::new(Notify::new());
        let raw = "b".repeat(1001);
        let h = Harness::with_reprocessor(&raw, RecordingReprocessor::gated(gate.clone()));

        let ack = h.handle("Explique tudo").await;

        // Everything below holds before the background job runs.
        assert_eq!(h.outbound.texts(), vec![h.config().processing_notice.clone()]);
        assert_eq!(h.store.count(SENDER, Role::Bot).await, 0);
        assert_eq!(responses(ack), vec![AckOutcome::Deferred]);
        assert_eq!(h.pipeline.tasks().len(), 1);
        assert!(h.reprocessor.jobs().is_empty());

        gate.notify_one();
        h.pipeline.tasks().shutdown().await;

        let jobs = h.reprocessor.jobs();
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.sender_id, SENDER);
        assert_eq!(job.original_text, "Explique tudo");
        assert_eq!(job.raw_answer, raw);
        assert_eq!(job.context[0].source, "faq.md");
        assert_eq!(job.history.len(), 1);
    }

    #[tokio::test]
    async fn deferred_job_carries_pre_filter_answer() {
        struct Shrink;
        impl SafetyFilter for Shrink {
            fn filter(&self, answer: &str, _original: &str) -> String {
                answer.replace("segredo", "[removido]")
            }
        }

        let raw = format!("segredo {}", "c".repeat(1100));
        let mut h = Harness::new(&raw);
        h.pipeline.collaborators.filter = Arc::new(Shrink);

        h.handle("Oi").await;
        h.pipeline.tasks().shutdown().await;

        assert_eq!(h.reprocessor.jobs()[0].raw_answer, raw);
    }

    #[tokio::test]
    async fn failed_notice_still_acknowledges_and_launches() {
        let h = Harness::new(&"d".repeat(1500));
        h.outbound.fail_on(h.config().processing_notice.clone());

        let ack = h.handle("Oi").await;
        h.pipeline.tasks().shutdown().await;

        assert!(h.outbound.sent().is_empty());
        assert_eq!(responses(ack), vec![AckOutcome::Deferred]);
        assert_eq!(h.reprocessor.jobs().len(), 1);
    }

    #[tokio::test]
    async fn launch_failure_after_acknowledgment_is_contained() {
        let h = Harness::new(&"e".repeat(1500));
        h.pipeline.tasks().shutdown().await;

        let ack = h.handle("Oi").await;

        assert_eq!(responses(ack), vec![AckOutcome::Deferred]);
        assert!(h.reprocessor.jobs().is_empty());
        assert!(!h.outbound.texts().contains(&h.config().failure_apology));
    }

    #[derive(Debug, Clone, Copy)]
    enum Failure {
        Persist,
        Embed,
        Retrieve,
        History,
        Generate,
        StoreAnswer,
        Deliver,
    }

    fn inject(h: &Harness, failure: Failure) {
        match failure {
            Failure::Persist => *h.store.fail_role.lock().unwrap() = Some(Role::User),
            Failure::Embed => *h.embedder.behavior.lock().unwrap() = EmbedBehavior::Fail,
            Failure::Retrieve => *h.retriever.fail.lock().unwrap() = true,
            Failure::History => *h.store.fail_history.lock().unwrap() = true,
            Failure::Generate => *h.generator.fail.lock().unwrap() = true,
            Failure::StoreAnswer => *h.store.fail_role.lock().unwrap() = Some(Role::Bot),
            Failure::Deliver => h.outbound.fail_on("resposta"),
        }
    }

    #[rstest]
    #[case(Failure::Persist)]
    #[case(Failure::Embed)]
    #[case(Failure::Retrieve)]
    #[case(Failure::History)]
    #[case(Failure::Generate)]
    #[case(Failure::StoreAnswer)]
    #[case(Failure::Deliver)]
    #[tokio::test]
    async fn stage_failure_apologizes_and_acknowledges_once(#[case] failure: Failure) {
        let h = Harness::new("resposta");
        inject(&h, failure);

        let ack = h.handle("Oi").await;

        assert_eq!(h.outbound.texts(), vec![h.config().failure_apology.clone()]);
        assert_eq!(responses(ack), vec![AckOutcome::Failed]);
    }

    #[tokio::test]
    async fn failed_apology_still_acknowledges() {
        let h = Harness::new("resposta");
        *h.generator.fail.lock().unwrap() = true;
        *h.outbound.fail_all.lock().unwrap() = true;

        let ack = h.handle("Oi").await;

        assert!(h.outbound.sent().is_empty());
        assert_eq!(responses(ack), vec![AckOutcome::Failed]);
    }

    #[tokio::test]
    async fn failed_empty_answer_apology_goes_through_failure_handler() {
        let h = Harness::new("");
        h.outbound.fail_on(h.config().empty_answer_apology.clone());

        let ack = h.handle("Oi").await;

        assert_eq!(h.outbound.texts(), vec![h.config().failure_apology.clone()]);
        assert_eq!(responses(ack), vec![AckOutcome::Failed]);
    }

    #[tokio::test]
    async fn failure_after_acknowledgment_sends_nothing() {
        let h = Harness::new("resposta");
        let mut ack = AckTracker::new(RecordingResponder::default());
        ack.acknowledge(AckOutcome::Deferred);

        let inbound = InboundMessage::new(SENDER, "Oi").unwrap();
        h.pipeline
            .handle_failure(&inbound, &mut ack, Error::stage(Stage::Deliver, "late"))
            .await;

        assert!(h.outbound.sent().is_empty());
        assert_eq!(responses(ack), vec![AckOutcome::Deferred]);
    }

    #[tokio::test]
    async fn forced_second_acknowledgment_is_ignored() {
        let h = Harness::new("resposta");
        let mut ack = h.handle("Oi").await;

        assert!(!ack.acknowledge(AckOutcome::Failed));
        assert!(!ack.acknowledge(AckOutcome::Delivered));
        assert_eq!(responses(ack), vec![AckOutcome::Delivered]);
    }
}
