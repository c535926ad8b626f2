//! Config loading and collaborator wiring shared by the `gateway` and `ask`
//! commands.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    answerline_agents::{AnswerGenerator, OpenAiChatGenerator},
    answerline_auto_reply::{
        BackgroundTasks, Collaborators, GuardrailFilter, Pipeline, SafetyFilter, ShortenAndSend,
    },
    answerline_channels::ChannelOutbound,
    answerline_config::AnswerlineConfig,
    answerline_memory::{DocumentIndex, EmbeddingProvider, OpenAiEmbeddingProvider},
    answerline_sessions::{ConversationStore, MemoryConversationStore, SqliteConversationStore},
    tracing::{info, warn},
};

/// Load the config named on the command line, or discover one.
///
/// Returns the config together with the file it came from, if any.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<(AnswerlineConfig, Option<PathBuf>)> {
    match explicit {
        Some(path) => Ok((answerline_config::load_config(path)?, Some(path.to_path_buf()))),
        None => Ok((
            answerline_config::discover_and_load(),
            answerline_config::find_config_file(),
        )),
    }
}

/// Open the conversation store selected by `storage.database_url`.
pub async fn open_store(config: &AnswerlineConfig) -> anyhow::Result<Arc<dyn ConversationStore>> {
    if config.storage.is_in_memory() {
        info!("conversation history kept in memory");
        return Ok(Arc::new(MemoryConversationStore::new()));
    }
    let store = SqliteConversationStore::connect(&config.storage.database_url).await?;
    Ok(Arc::new(store))
}

/// Build the pipeline and every collaborator behind it.
///
/// Indexes `retrieval.docs_dir` before returning, so the first webhook call
/// already sees the whole knowledge base.
pub async fn build_pipeline(
    config: &AnswerlineConfig,
    outbound: Arc<dyn ChannelOutbound>,
) -> anyhow::Result<Pipeline> {
    let providers = &config.providers;
    let store = open_store(config).await?;

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(
        OpenAiEmbeddingProvider::new(providers.api_key.clone())
            .with_model(&providers.embedding_model)
            .with_base_url(&providers.base_url),
    );

    let retrieval = &config.retrieval;
    let index = Arc::new(DocumentIndex::new(retrieval.top_k, retrieval.min_score));
    match retrieval.docs_dir {
        Some(ref dir) => {
            index
                .index_dir(
                    dir,
                    embedder.as_ref(),
                    retrieval.chunk_size,
                    retrieval.chunk_overlap,
                )
                .await?;
        },
        None => warn!("retrieval.docs_dir not set, answers will have no document context"),
    }

    let mut chat = OpenAiChatGenerator::new(providers.api_key.clone(), &providers.chat_model)
        .with_base_url(&providers.base_url)
        .with_temperature(providers.temperature);
    if let Some(ref prompt) = providers.system_prompt {
        chat = chat.with_system_prompt(prompt);
    }
    let generator: Arc<dyn AnswerGenerator> = Arc::new(chat);
    let filter: Arc<dyn SafetyFilter> = Arc::new(GuardrailFilter::new(&config.guardrails)?);

    let reprocessor = Arc::new(ShortenAndSend::new(
        Arc::clone(&generator),
        Arc::clone(&filter),
        Arc::clone(&store),
        Arc::clone(&outbound),
        config.pipeline.max_answer_chars,
    ));

    info!(
        chat_model = generator.model_name(),
        embedding_model = embedder.model_name(),
        channel = outbound.id(),
        max_answer_chars = config.pipeline.max_answer_chars,
        "pipeline ready"
    );

    Ok(Pipeline::new(
        Collaborators {
            store,
            embedder,
            retriever: index,
            generator,
            filter,
            outbound,
            reprocessor,
        },
        BackgroundTasks::new(),
        config.pipeline.clone(),
    ))
}
