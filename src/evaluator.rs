use crate::corpus::{AnalogyCorpus, AnalogyGroup, AnalogyTuple};
use crate::error::{EvalError, GroupNotFound};
use crate::lookup::EmbeddingLookup;
use log::{debug, info, trace};
use rayon::prelude::*;
use std::fmt;

/// Accuracy of one embedding on one group of questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreResult {
    pub group: String,
    /// questions attempted
    pub total: usize,
    pub correct: usize,
    /// questions the lookup could not answer, e.g. out of vocabulary words.
    /// Part of `total`, scored as wrong.
    pub unanswered: usize,
}

impl ScoreResult {
    pub fn new(group: impl Into<String>) -> ScoreResult {
        ScoreResult {
            group: group.into(),
            total: 0,
            correct: 0,
            unanswered: 0,
        }
    }

    /// Percentage of correct answers, 0 for an empty group.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.correct as f64 / self.total as f64
        }
    }

    /// Percentage of questions the lookup could answer at all.
    pub fn coverage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * (self.total - self.unanswered) as f64 / self.total as f64
        }
    }

    /// Sum several results under a new label.
    pub fn merged<'a, I>(label: impl Into<String>, results: I) -> ScoreResult
    where
        I: IntoIterator<Item = &'a ScoreResult>,
    {
        results
            .into_iter()
            .fold(ScoreResult::new(label), |mut acc, r| {
                acc.total += r.total;
                acc.correct += r.correct;
                acc.unanswered += r.unanswered;
                acc
            })
    }

    fn record(&mut self, outcome: Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Correct => self.correct += 1,
            Outcome::Wrong => {}
            Outcome::Unanswered => self.unanswered += 1,
        }
    }
}

impl fmt::Display for ScoreResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.2}% ({}/{})",
            self.group,
            self.accuracy(),
            self.correct,
            self.total
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Correct,
    Wrong,
    Unanswered,
}

// "a is to b as c is to ?" is answered by the words closest to b + c - a.
fn score_tuple<L>(tuple: &AnalogyTuple, lookup: &L, top_k: usize) -> Outcome
where
    L: EmbeddingLookup + ?Sized,
{
    let AnalogyTuple { a, b, c, expected } = tuple;
    match lookup.most_similar(&[b.as_str(), c.as_str()], &[a.as_str()], top_k) {
        Ok(candidates) => {
            trace!("{a} {b} {c} -> {candidates:?}");
            if candidates.iter().take(top_k).any(|(word, _)| word == expected) {
                Outcome::Correct
            } else {
                Outcome::Wrong
            }
        }
        Err(e) => {
            debug!("{a} {b} {c} {expected}: {e}");
            Outcome::Unanswered
        }
    }
}

/// Score every question of `group`. A question is correct when the expected
/// word is within the `top_k` candidates returned by the lookup.
pub fn evaluate<L>(group: &AnalogyGroup, lookup: &L, top_k: usize) -> ScoreResult
where
    L: EmbeddingLookup + ?Sized,
{
    let mut result = ScoreResult::new(group.name());
    for tuple in group {
        result.record(score_tuple(tuple, lookup, top_k));
    }
    result
}

/// Same as `evaluate`, questions are scored on the rayon thread pool.
pub fn evaluate_parallel<L>(group: &AnalogyGroup, lookup: &L, top_k: usize) -> ScoreResult
where
    L: EmbeddingLookup + ?Sized,
{
    let outcomes: Vec<Outcome> = group
        .tuples()
        .par_iter()
        .map(|tuple| score_tuple(tuple, lookup, top_k))
        .collect();

    let mut result = ScoreResult::new(group.name());
    for outcome in outcomes {
        result.record(outcome);
    }
    result
}

/// Scoring options shared by a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluator {
    top_k: usize,
    parallel: bool,
}

impl Evaluator {
    pub fn new(top_k: usize) -> Result<Evaluator, EvalError> {
        if top_k == 0 {
            return Err(EvalError::InvalidTopK);
        }
        Ok(Evaluator {
            top_k,
            parallel: false,
        })
    }

    pub fn with_parallel(self, parallel: bool) -> Evaluator {
        Evaluator { parallel, ..self }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn evaluate<L>(&self, group: &AnalogyGroup, lookup: &L) -> ScoreResult
    where
        L: EmbeddingLookup + ?Sized,
    {
        info!(
            "Evaluating group '{}' ({} questions, top {})",
            group.name(),
            group.len(),
            self.top_k
        );
        let result = if self.parallel {
            evaluate_parallel(group, lookup, self.top_k)
        } else {
            evaluate(group, lookup, self.top_k)
        };
        debug!("{result}, {} unanswered", result.unanswered);
        result
    }

    /// Every group of the corpus, in file order.
    pub fn evaluate_corpus<L>(&self, corpus: &AnalogyCorpus, lookup: &L) -> Vec<ScoreResult>
    where
        L: EmbeddingLookup + ?Sized,
    {
        corpus
            .groups()
            .iter()
            .map(|group| self.evaluate(group, lookup))
            .collect()
    }

    /// The named groups; a missing name does not stop the others.
    pub fn evaluate_groups<L, S>(
        &self,
        corpus: &AnalogyCorpus,
        names: &[S],
        lookup: &L,
    ) -> Vec<Result<ScoreResult, GroupNotFound>>
    where
        L: EmbeddingLookup + ?Sized,
        S: AsRef<str>,
    {
        names
            .iter()
            .map(|name| {
                corpus
                    .select_group(name.as_ref())
                    .map(|group| self.evaluate(group, lookup))
            })
            .collect()
    }
}

/// Category of a group in the Mikolov question set: grammatical groups are
/// named `gram*`, the rest are semantic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Semantic,
    Syntactic,
}

impl GroupKind {
    pub fn of(group: &str) -> GroupKind {
        if group.starts_with("gram") {
            GroupKind::Syntactic
        } else {
            GroupKind::Semantic
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GroupKind::Semantic => "SEMANTIC",
            GroupKind::Syntactic => "SYNTACTIC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::WordVectors;
    use crate::error::LookupError;
    use crate::lookup::Neighbours;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashMap;

    /// Canned answers keyed by (a, b, c); unknown queries are out of vocabulary.
    #[derive(Default)]
    struct FakeLookup {
        answers: HashMap<(String, String, String), Vec<&'static str>>,
    }

    impl FakeLookup {
        fn answer(mut self, a: &str, b: &str, c: &str, ranked: &[&'static str]) -> Self {
            self.answers
                .insert((a.into(), b.into(), c.into()), ranked.to_vec());
            self
        }
    }

    impl EmbeddingLookup for FakeLookup {
        fn most_similar(
            &self,
            positive: &[&str],
            negative: &[&str],
            top_k: usize,
        ) -> Result<Neighbours, LookupError> {
            let key: (String, String, String) =
                (negative[0].into(), positive[0].into(), positive[1].into());
            let ranked = self
                .answers
                .get(&key)
                .ok_or_else(|| LookupError::OutOfVocabulary {
                    word: positive[0].into(),
                })?;
            Ok(ranked
                .iter()
                .take(top_k)
                .enumerate()
                .map(|(i, w)| (w.to_string(), 1.0 - i as f64 / 10.0))
                .collect())
        }
    }

    fn sample() -> AnalogyCorpus {
        AnalogyCorpus::parse_str(": sample\na b c d\ne f g h\n")
    }

    #[test]
    fn half_right_is_fifty_percent() {
        let corpus = sample();
        let lookup = FakeLookup::default()
            .answer("a", "b", "c", &["d"])
            .answer("e", "f", "g", &["z"]);
        let result = evaluate(corpus.select_group("sample").unwrap(), &lookup, 1);
        assert_eq!(result.total, 2);
        assert_eq!(result.correct, 1);
        assert_eq!(result.accuracy(), 50.0);
        assert_eq!(result.to_string(), "sample: 50.00% (1/2)");
    }

    #[test]
    fn empty_group_scores_zero() {
        let group = AnalogyGroup::new("empty", Vec::new());
        let result = evaluate(&group, &FakeLookup::default(), 10);
        assert_eq!(result.total, 0);
        assert_eq!(result.accuracy(), 0.0);
        assert_eq!(result.coverage(), 0.0);
    }

    #[test]
    fn answer_anywhere_in_top_k_counts() {
        let corpus = sample();
        let group = corpus.select_group("sample").unwrap();
        let lookup = FakeLookup::default()
            .answer("a", "b", "c", &["x", "y", "d"])
            .answer("e", "f", "g", &["x", "h"]);

        assert_eq!(evaluate(group, &lookup, 10).accuracy(), 100.0);
        assert_eq!(evaluate(group, &lookup, 2).correct, 1);
        assert_eq!(evaluate(group, &lookup, 1).accuracy(), 0.0);
    }

    #[test]
    fn unanswered_questions_are_wrong_not_fatal() {
        let corpus = AnalogyCorpus::parse_str(": g\na b c d\nunknown f g h\ne f g h\n");
        let lookup = FakeLookup::default()
            .answer("a", "b", "c", &["d"])
            .answer("e", "f", "g", &["h"]);
        let result = evaluate(corpus.select_group("g").unwrap(), &lookup, 1);
        assert_eq!(
            result,
            ScoreResult {
                group: "g".into(),
                total: 3,
                correct: 2,
                unanswered: 1,
            }
        );
        assert!((result.coverage() - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn malformed_lines_are_not_counted() {
        let corpus = AnalogyCorpus::parse_str(": g\na b c\ne f g h\n");
        let lookup = FakeLookup::default().answer("e", "f", "g", &["h"]);
        let result = evaluate(corpus.select_group("g").unwrap(), &lookup, 1);
        assert_eq!(result.total, 1);
        assert_eq!(result.accuracy(), 100.0);
    }

    #[test]
    fn never_listing_the_answer_scores_zero() {
        let corpus = sample();
        let lookup = FakeLookup::default()
            .answer("a", "b", "c", &["p", "q"])
            .answer("e", "f", "g", &["r"]);
        let result = evaluate(corpus.select_group("sample").unwrap(), &lookup, 10);
        assert_eq!(result.accuracy(), 0.0);
        assert_eq!(result.unanswered, 0);
    }

    #[test]
    fn evaluator_rejects_zero_top_k() {
        assert_eq!(Evaluator::new(0), Err(EvalError::InvalidTopK));
        assert_eq!(Evaluator::new(3).unwrap().top_k(), 3);
    }

    #[test]
    fn evaluate_groups_reports_missing_names() {
        let corpus = sample();
        let lookup = FakeLookup::default()
            .answer("a", "b", "c", &["d"])
            .answer("e", "f", "g", &["h"]);
        let evaluator = Evaluator::new(1).unwrap();
        let results = evaluator.evaluate_groups(&corpus, &["missing", "sample"], &lookup);
        assert_eq!(
            results[0],
            Err(GroupNotFound {
                name: "missing".into()
            })
        );
        assert_eq!(results[1].as_ref().unwrap().accuracy(), 100.0);
    }

    #[test]
    fn merged_results_sum_counts() {
        let corpus = AnalogyCorpus::parse_str(
            ": family\na b c d\n: gram1-adjective-to-adverb\ne f g h\ni j k l\n",
        );
        let lookup = FakeLookup::default()
            .answer("a", "b", "c", &["d"])
            .answer("e", "f", "g", &["h"]);
        let results = Evaluator::new(1).unwrap().evaluate_corpus(&corpus, &lookup);
        assert_eq!(results.len(), 2);

        let syntactic: Vec<&ScoreResult> = results
            .iter()
            .filter(|r| GroupKind::of(&r.group) == GroupKind::Syntactic)
            .collect();
        assert_eq!(syntactic.len(), 1);

        let overall = ScoreResult::merged("OVERALL", &results);
        assert_eq!(overall.total, 3);
        assert_eq!(overall.correct, 2);
        assert_eq!(overall.unanswered, 1);
    }

    #[test]
    fn real_vectors_solve_an_easy_analogy() {
        let wv = WordVectors::from_pairs([
            ("man", vec![1.0, 0.0, 0.0]),
            ("woman", vec![1.0, 1.0, 0.0]),
            ("king", vec![1.0, 0.0, 1.0]),
            ("queen", vec![1.0, 1.0, 1.0]),
            ("apple", vec![-1.0, 0.0, 0.0]),
        ])
        .unwrap();
        let corpus = AnalogyCorpus::parse_str(": family\nman woman king queen\n");
        let result = evaluate(corpus.select_group("family").unwrap(), &wv, 1);
        assert_eq!(result.accuracy(), 100.0);
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut rng = StdRng::seed_from_u64(7);
        let vocab: Vec<String> = (0..200).map(|i| format!("w{i}")).collect();
        let wv = WordVectors::from_pairs(
            vocab
                .iter()
                .map(|w| (w, (0..8).map(|_| rng.random::<f64>() - 0.5).collect::<Vec<f64>>())),
        )
        .unwrap();

        let mut source = String::from(": random\n");
        for _ in 0..100 {
            let picks: Vec<&str> = (0..4)
                .map(|_| vocab[rng.random_range(0..vocab.len())].as_str())
                .collect();
            source.push_str(&picks.join(" "));
            source.push('\n');
        }
        source.push_str("oov w1 w2 w3\n");

        let corpus = AnalogyCorpus::parse_str(&source);
        let group = corpus.select_group("random").unwrap();
        for top_k in [1, 10] {
            let sequential = evaluate(group, &wv, top_k);
            assert_eq!(sequential, evaluate_parallel(group, &wv, top_k));
            assert_eq!(sequential.total, 101);
            assert_eq!(sequential.unanswered, 1);
        }

        let evaluator = Evaluator::new(10).unwrap().with_parallel(true);
        assert_eq!(evaluator.evaluate(group, &wv), evaluate(group, &wv, 10));
    }
}
