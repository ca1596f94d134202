use crate::error::LookupError;

/// Ranked `(word, score)` candidates, nearest first.
pub type Neighbours = Vec<(String, f64)>;

/// Nearest-neighbour queries over a loaded embedding.
///
/// Implementations must be read-only so a single model can be shared between
/// threads evaluating different questions.
pub trait EmbeddingLookup: Sync {
    /// Words closest to the combination of `positive` minus `negative`,
    /// at most `top_k` of them. Query words are never returned.
    fn most_similar(
        &self,
        positive: &[&str],
        negative: &[&str],
        top_k: usize,
    ) -> Result<Neighbours, LookupError>;

    fn similar_by_word(&self, word: &str, top_k: usize) -> Result<Neighbours, LookupError> {
        self.most_similar(&[word], &[], top_k)
    }
}

impl<T: EmbeddingLookup + ?Sized> EmbeddingLookup for &T {
    fn most_similar(
        &self,
        positive: &[&str],
        negative: &[&str],
        top_k: usize,
    ) -> Result<Neighbours, LookupError> {
        (**self).most_similar(positive, negative, top_k)
    }

    fn similar_by_word(&self, word: &str, top_k: usize) -> Result<Neighbours, LookupError> {
        (**self).similar_by_word(word, top_k)
    }
}

impl<T: EmbeddingLookup + ?Sized> EmbeddingLookup for Box<T> {
    fn most_similar(
        &self,
        positive: &[&str],
        negative: &[&str],
        top_k: usize,
    ) -> Result<Neighbours, LookupError> {
        (**self).most_similar(positive, negative, top_k)
    }

    fn similar_by_word(&self, word: &str, top_k: usize) -> Result<Neighbours, LookupError> {
        (**self).similar_by_word(word, top_k)
    }
}
