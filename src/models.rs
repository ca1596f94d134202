//! Loading the embeddings named on the command line.
use crate::embedding::{
    EmbeddingFormat, WordVectors, glove_to_word2vec, is_newer, word2vec_path_for,
};
use crate::error::EmbeddingLoadError;
use anyhow::Context;
use log::{info, warn};
use std::path::Path;

/// A loaded embedding and the name it is reported under.
pub struct NamedModel {
    pub label: &'static str,
    pub vectors: WordVectors,
}

/// Word2vec file, binary when the extension is `.bin`.
pub fn load_word2vec(path: &Path) -> Result<WordVectors, EmbeddingLoadError> {
    WordVectors::load(path, EmbeddingFormat::from_path(path))
}

/// GloVe file. The word2vec copy with the header line is written next to the
/// original and reused while it is newer than the original. When the copy
/// cannot be written the GloVe file is read directly.
pub fn load_glove(path: &Path) -> Result<WordVectors, EmbeddingLoadError> {
    let converted = word2vec_path_for(path);
    if is_newer(&converted, path) {
        info!("Reusing converted embedding {}", converted.display());
    } else {
        match glove_to_word2vec(path, &converted) {
            Ok(_) => {}
            Err(EmbeddingLoadError::Io(e)) if path.is_file() => {
                warn!(
                    "cannot write {}: {e}, reading {} as GloVe",
                    converted.display(),
                    path.display()
                );
                return WordVectors::load(path, EmbeddingFormat::Glove);
            }
            Err(e) => return Err(e),
        }
    }
    WordVectors::load(&converted, EmbeddingFormat::Word2VecText)
}

/// Load whichever of the two embeddings was given; an unreadable file ends the run.
pub fn load_models(w2v: Option<&Path>, glove: Option<&Path>) -> anyhow::Result<Vec<NamedModel>> {
    let mut models = Vec::new();
    if let Some(path) = w2v {
        let vectors = load_word2vec(path).with_context(|| {
            format!("Unable to read file {}. Please check the error above", path.display())
        })?;
        models.push(NamedModel {
            label: "Word2Vec",
            vectors,
        });
    }
    if let Some(path) = glove {
        let vectors = load_glove(path).with_context(|| {
            format!("Unable to read file {}. Please check the error above", path.display())
        })?;
        models.push(NamedModel {
            label: "GloVe",
            vectors,
        });
    }
    Ok(models)
}
