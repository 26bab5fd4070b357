//! Answer cache domain - cached evaluations and their keys

mod config;
mod key;
mod record;
mod resolution;

pub use config::AnswerCacheConfig;
pub use key::{normalize_answer, question_set_key};
pub use record::CachedAnswerRecord;
pub use resolution::{Resolution, ResolutionSource};
