//! Word-analogy evaluation of pre-trained word embeddings.
//!
//! An [`AnalogyCorpus`] holds named groups of "a is to b as c is to d"
//! questions. The [`Evaluator`] asks an [`EmbeddingLookup`] for the words
//! nearest to `b + c - a` and counts a question as correct when `d` is among
//! the top K of them.
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod evaluator;
pub mod logging;
pub mod lookup;
pub mod models;

pub use corpus::{AnalogyCorpus, AnalogyGroup, AnalogyTuple, MalformedLine};
pub use embedding::{EmbeddingFormat, WordVectors};
pub use error::{
    CorpusError, EmbeddingLoadError, EvalError, GroupNotFound, LookupError, MalformedTuple,
};
pub use evaluator::{Evaluator, GroupKind, ScoreResult, evaluate, evaluate_parallel};
pub use lookup::{EmbeddingLookup, Neighbours};
pub use models::{NamedModel, load_models};
