//! Query pipeline: retrieve, assemble, generate.
//!
//! [`QueryService::answer`] is the only place in the crate that swallows
//! errors. Every failure is logged and turned into a message for the user.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, field, info, instrument, Span};

use super::prompt_assembler::PromptAssembler;
use super::retriever::Retriever;
use crate::domain::errors::{DomainError, DomainResult, ErrorKind};
use crate::domain::models::{QueryResult, QueryStage, SearchResult};
use crate::domain::ports::GenerationClient;

const DEFAULT_TOP_K: usize = 4;
const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(30);

pub const EMPTY_QUESTION_REPLY: &str = "Please ask a question about bus provider policies.";

pub const TRANSIENT_FAILURE_REPLY: &str = "Sorry, the policy assistant is temporarily unavailable. \
Please try again in a moment.";

pub const CONFIGURATION_FAILURE_REPLY: &str = "Sorry, the policy assistant is not configured correctly \
and cannot answer right now. Please contact the operator.";

pub const INTERNAL_FAILURE_REPLY: &str = "Sorry, something went wrong while looking up provider \
policies. Please try again later.";

/// A typed answer plus the scored chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct ScoredAnswer {
    pub result: QueryResult,
    pub sources: Vec<SearchResult>,
}

pub struct QueryService {
    retriever: Arc<Retriever>,
    assembler: PromptAssembler,
    generator: Arc<dyn GenerationClient>,
    top_k: usize,
    stage_timeout: Duration,
}

impl QueryService {
    pub fn new(retriever: Arc<Retriever>, generator: Arc<dyn GenerationClient>) -> Self {
        Self {
            retriever,
            assembler: PromptAssembler::new(),
            generator,
            top_k: DEFAULT_TOP_K,
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Upper bound for each external stage (query embedding, search, generation).
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answer `query` from `collection`. Never fails: errors are logged and
    /// replaced by an explanatory message.
    pub async fn answer(&self, query: &str, collection: &str) -> String {
        match self.run(query, collection).await {
            Ok(result) => result.answer,
            Err(e) => Self::failure_reply(&e).to_string(),
        }
    }

    /// Typed variant of [`QueryService::answer`].
    pub async fn run(&self, query: &str, collection: &str) -> DomainResult<QueryResult> {
        self.run_scored(query, collection, self.top_k)
            .await
            .map(|scored| scored.result)
    }

    /// Run the pipeline with an explicit `k`, keeping distances for display.
    #[instrument(
        name = "query",
        skip(self, query),
        fields(stage = field::Empty, query_chars = query.chars().count())
    )]
    pub async fn run_scored(&self, query: &str, collection: &str, k: usize) -> DomainResult<ScoredAnswer> {
        let question = query.trim();
        if question.is_empty() {
            Self::enter(QueryStage::Done);
            return Ok(ScoredAnswer {
                result: QueryResult {
                    query: query.to_string(),
                    retrieved_chunks: Vec::new(),
                    answer: EMPTY_QUESTION_REPLY.to_string(),
                },
                sources: Vec::new(),
            });
        }

        let outcome = self.pipeline(question, collection, k).await;
        match &outcome {
            Ok(answer) => {
                Self::enter(QueryStage::Done);
                info!(chunks = answer.sources.len(), "Answered question");
            }
            Err(e) => {
                let failed_stage = Span::current();
                Self::log_failure(e, self.generator.name());
                failed_stage.record("stage", QueryStage::Failed.as_str());
            }
        }
        outcome
    }

    async fn pipeline(&self, question: &str, collection: &str, k: usize) -> DomainResult<ScoredAnswer> {
        Retriever::check_k(k)?;

        Self::enter(QueryStage::EmbeddingQuery);
        let sources = match self.retriever.searchable_collection(collection).await? {
            None => Vec::new(),
            Some(_) => {
                let vector = self
                    .bounded(QueryStage::EmbeddingQuery, self.retriever.embed_query(question))
                    .await?;

                Self::enter(QueryStage::Searching);
                self.bounded(QueryStage::Searching, self.retriever.search(collection, &vector, k))
                    .await?
            }
        };

        Self::enter(QueryStage::AssemblingPrompt);
        let retrieved_chunks: Vec<_> = sources.iter().map(|r| r.chunk.clone()).collect();
        let prompt = self.assembler.assemble(question, &retrieved_chunks);

        Self::enter(QueryStage::Generating);
        let answer = self
            .bounded(QueryStage::Generating, self.generator.generate(&prompt))
            .await?;

        Ok(ScoredAnswer {
            result: QueryResult {
                query: question.to_string(),
                retrieved_chunks,
                answer: answer.trim().to_string(),
            },
            sources,
        })
    }

    async fn bounded<T>(
        &self,
        stage: QueryStage,
        call: impl Future<Output = DomainResult<T>>,
    ) -> DomainResult<T> {
        tokio::time::timeout(self.stage_timeout, call)
            .await
            .map_err(|_| DomainError::Timeout {
                stage: stage.to_string(),
                after_ms: u64::try_from(self.stage_timeout.as_millis()).unwrap_or(u64::MAX),
            })?
    }

    fn enter(stage: QueryStage) {
        Span::current().record("stage", stage.as_str());
    }

    fn log_failure(e: &DomainError, generator: &str) {
        match e {
            DomainError::Provider {
                provider,
                endpoint,
                status,
                transient,
                ..
            } => error!(
                error = %e,
                provider = %provider,
                endpoint = %endpoint,
                status = ?status,
                transient,
                "Query failed"
            ),
            DomainError::Timeout { stage, after_ms } => error!(
                error = %e,
                timed_out_stage = %stage,
                after_ms,
                generator,
                "Query failed"
            ),
            other => error!(error = %other, kind = ?other.kind(), "Query failed"),
        }
    }

    /// The user-facing message for a failed query.
    pub fn failure_reply(e: &DomainError) -> &'static str {
        match e.kind() {
            ErrorKind::Transient => TRANSIENT_FAILURE_REPLY,
            ErrorKind::Configuration => CONFIGURATION_FAILURE_REPLY,
            ErrorKind::Data | ErrorKind::Internal => INTERNAL_FAILURE_REPLY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CollectionSpec, WriteMode};
    use crate::domain::ports::{EmbeddingProvider, VectorStore};
    use crate::services::test_support::{embedded, memory_store, FixedEmbedder, ScriptedGenerator};

    async fn service(
        embedder: Arc<FixedEmbedder>,
        generator: Arc<ScriptedGenerator>,
        populate: bool,
    ) -> QueryService {
        let store = memory_store().await;
        if populate {
            store
                .write(
                    &CollectionSpec::new("c", embedder.model(), embedder.dimension()),
                    &[
                        embedded("Refunds are processed within 14 days.", embedder.embed("refunds processed days").await.unwrap()),
                        embedded("Pets are not allowed.", embedder.embed("pets allowed").await.unwrap()),
                    ],
                    WriteMode::Append,
                )
                .await
                .unwrap();
        }
        let retriever = Arc::new(Retriever::new(embedder, store));
        QueryService::new(retriever, generator).with_top_k(1)
    }

    #[tokio::test]
    async fn test_answer_grounds_prompt_in_retrieved_chunk() {
        let generator = Arc::new(ScriptedGenerator::answering("Within 14 days."));
        let service = service(Arc::new(FixedEmbedder::new(32)), generator.clone(), true).await;

        let result = service.run("How many days until refunds are processed?", "c").await.unwrap();
        assert_eq!(result.answer, "Within 14 days.");
        assert_eq!(result.retrieved_chunks.len(), 1);
        assert!(result.retrieved_chunks[0].text.contains("14 days"));
        assert!(generator.prompts()[0].contains("Refunds are processed within 14 days."));
    }

    #[tokio::test]
    async fn test_empty_collection_still_answers() {
        let generator = Arc::new(ScriptedGenerator::answering("I cannot answer based on the available provider data."));
        let embedder = Arc::new(FixedEmbedder::new(8));
        let service = service(embedder.clone(), generator.clone(), false).await;

        let answer = service.answer("What is the refund policy?", "empty").await;
        assert!(!answer.is_empty());
        assert_eq!(embedder.calls(), 0);
        assert!(generator.prompts()[0].contains("(no context available)"));
    }

    #[tokio::test]
    async fn test_empty_question_short_circuits() {
        let generator = Arc::new(ScriptedGenerator::answering("unused"));
        let service = service(Arc::new(FixedEmbedder::new(8)), generator.clone(), false).await;

        assert_eq!(service.answer("   ", "c").await, EMPTY_QUESTION_REPLY);
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_transient_generation_failure_becomes_apology() {
        let service = service(
            Arc::new(FixedEmbedder::new(32)),
            Arc::new(ScriptedGenerator::unavailable()),
            true,
        )
        .await;

        assert_eq!(service.answer("refunds?", "c").await, TRANSIENT_FAILURE_REPLY);
        assert!(service.run("refunds?", "c").await.unwrap_err().is_transient());
    }

    #[tokio::test]
    async fn test_generation_timeout_is_transient() {
        let service = service(
            Arc::new(FixedEmbedder::new(32)),
            Arc::new(ScriptedGenerator::hanging(Duration::from_secs(600))),
            true,
        )
        .await
        .with_stage_timeout(Duration::from_millis(50));

        let err = service.run("refunds?", "c").await.unwrap_err();
        assert!(matches!(err, DomainError::Timeout { ref stage, .. } if stage == "generating"));
        assert_eq!(service.answer("refunds?", "c").await, TRANSIENT_FAILURE_REPLY);
    }

    #[tokio::test]
    async fn test_query_embedding_failure_becomes_apology() {
        // Two calls populate the collection; the query embedding is the third.
        let embedder = Arc::new(FixedEmbedder::new(32).failing_after(2));
        let generator = Arc::new(ScriptedGenerator::answering("unused"));
        let service = service(embedder, generator.clone(), true).await;

        assert_eq!(service.answer("refunds?", "c").await, TRANSIENT_FAILURE_REPLY);
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_zero_top_k_is_configuration_error() {
        let service = service(
            Arc::new(FixedEmbedder::new(8)),
            Arc::new(ScriptedGenerator::answering("unused")),
            false,
        )
        .await
        .with_top_k(0);

        assert!(service.run("refunds?", "c").await.unwrap_err().is_configuration());
        assert_eq!(service.answer("refunds?", "c").await, CONFIGURATION_FAILURE_REPLY);
    }

    #[test]
    fn test_failure_reply_by_kind() {
        let config = DomainError::MissingApiKey { provider: "gemini".into() };
        assert_eq!(QueryService::failure_reply(&config), CONFIGURATION_FAILURE_REPLY);
        let db = DomainError::DatabaseError("locked".into());
        assert_eq!(QueryService::failure_reply(&db), INTERNAL_FAILURE_REPLY);
    }
}
