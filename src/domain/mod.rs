//! Domain layer - Core business logic and entities

pub mod answer_cache;
pub mod cache;
pub mod embedding;
pub mod error;
pub mod evaluation;
pub mod llm;
pub mod question;
pub mod similarity;

pub use answer_cache::{
    normalize_answer, question_set_key, AnswerCacheConfig, CachedAnswerRecord, Resolution,
    ResolutionSource,
};
pub use cache::{CacheStore, CacheStoreExt};
pub use embedding::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, EmbeddingUsage};
pub use error::{DomainError, UpstreamErrorKind, UpstreamService};
pub use evaluation::{Evaluation, Evaluator};
pub use llm::{
    FinishReason, LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse, LlmResponseFormat,
    Message, MessageRole, Usage,
};
pub use question::{Question, QuestionId, QuestionRepository, QuestionValidationError};
pub use similarity::{cosine_similarity, VectorElement};
