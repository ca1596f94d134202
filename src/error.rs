use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to read an analogy corpus. Fatal: nothing can be evaluated.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("unable to read file {}, please verify that the file exists", path.display())]
    NotFound { path: PathBuf },

    #[error("error reading analogy corpus: {0}")]
    Io(#[from] io::Error),
}

/// Requested group is not in the corpus. The corpus is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("group {name} is not found")]
pub struct GroupNotFound {
    pub name: String,
}

/// A data line that did not split into exactly four words.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected 4 words, got {}", tokens.len())]
pub struct MalformedTuple {
    pub tokens: Vec<String>,
}

/// Per-query failure of an embedding lookup. Scored as a wrong answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("word '{word}' not in vocabulary")]
    OutOfVocabulary { word: String },

    #[error("cannot compute similarity of an empty or zero vector")]
    NoVectors,
}

/// Failure to load an embedding file. Fatal at startup.
#[derive(Debug, Error)]
pub enum EmbeddingLoadError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("{0}")]
    Format(String),

    #[error("no word vectors found in the file")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("top-k must be at least 1")]
    InvalidTopK,
}
