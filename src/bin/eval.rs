use analogy_eval::{
    AnalogyCorpus, Evaluator, GroupKind, NamedModel, ScoreResult, load_models, logging,
};
use anyhow::bail;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;

/// Command-line arguments parsed by Clap.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Executes analogy test on Word2Vec and/or GloVe embeddings.",
    long_about = None
)]
struct Cli {
    /// Filename of word2vec format pre-trained embedding, binary if the extension is .bin
    #[arg(long, value_name = "FILE")]
    w2v: Option<PathBuf>,
    /// Filename of glove format pre-trained embedding
    #[arg(long, value_name = "FILE")]
    glove: Option<PathBuf>,
    /// Analogy questions, groups introduced by ": <name>" lines
    #[arg(long, value_name = "FILE")]
    corpus: Option<PathBuf>,
    /// Group to evaluate, may be repeated. All groups when absent
    #[arg(short, long = "group", value_name = "NAME")]
    groups: Vec<String>,
    /// A question is correct if the answer is among this many nearest words
    #[arg(long, default_value_t = 10)]
    top_k: usize,
    /// Score the questions of a group in parallel
    #[arg(long)]
    parallel: bool,
    #[arg(short, long, default_value_t = 2)]
    verbose: i32,
}

/// Configuration parameters, built from command-line arguments.
#[derive(Debug, Clone)]
struct Config {
    corpus_file: PathBuf,
    groups: Vec<String>,
    evaluator: Evaluator,
}

/// Test one model on the configured groups, then print per-category and overall totals.
fn analogy_test(model: &NamedModel, corpus: &AnalogyCorpus, config: &Config) {
    println!(
        "\n{} ANALOGY TESTS (top {})",
        model.label,
        config.evaluator.top_k()
    );

    let results: Vec<ScoreResult> = if config.groups.is_empty() {
        config.evaluator.evaluate_corpus(corpus, &model.vectors)
    } else {
        config
            .evaluator
            .evaluate_groups(corpus, config.groups.as_slice(), &model.vectors)
            .into_iter()
            .filter_map(|result| match result {
                Ok(score) => Some(score),
                Err(e) => {
                    println!("{e}");
                    None
                }
            })
            .collect()
    };

    for r in &results {
        println!(
            "Group: {}, Accuracy: {:4.2}% ({}/{})",
            r.group,
            r.accuracy(),
            r.correct,
            r.total
        );
    }

    for kind in [GroupKind::Semantic, GroupKind::Syntactic] {
        let of_kind: Vec<&ScoreResult> = results
            .iter()
            .filter(|r| GroupKind::of(&r.group) == kind)
            .collect();
        if !of_kind.is_empty() {
            print_summary(&ScoreResult::merged(kind.label(), of_kind));
        }
    }
    print_summary(&ScoreResult::merged("OVERALL", &results));
}

fn print_summary(summary: &ScoreResult) {
    println!(
        "{} Total Accuracy: {:4.2}% ({}/{})",
        summary.group,
        summary.accuracy(),
        summary.correct,
        summary.total
    );
    println!(
        "{} Questions answered/total: {:4.2}% ({}/{})",
        summary.group,
        summary.coverage(),
        summary.total - summary.unanswered,
        summary.total
    );
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    if cli.w2v.is_none() && cli.glove.is_none() {
        println!("Provide at least one embedding file");
        Cli::command().print_help()?;
        return Ok(());
    }

    let Some(corpus_file) = cli.corpus else {
        bail!("an analogy corpus is required, pass it with --corpus <FILE>");
    };

    let config = Config {
        corpus_file,
        groups: cli.groups,
        evaluator: Evaluator::new(cli.top_k)?.with_parallel(cli.parallel),
    };

    let corpus = AnalogyCorpus::from_file(&config.corpus_file)?;
    let models = load_models(cli.w2v.as_deref(), cli.glove.as_deref())?;
    for model in &models {
        analogy_test(model, &corpus, &config);
    }
    Ok(())
}
