use analogy_eval::{AnalogyCorpus, Evaluator, NamedModel, load_models, logging};
use clap::{CommandFactory, Parser};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Interactive analogy test on Word2Vec and/or GloVe embeddings.",
    long_about = None
)]
struct Cli {
    /// Filename of word2vec format pre-trained embedding, binary if the extension is .bin
    #[arg(long, value_name = "FILE")]
    w2v: Option<PathBuf>,
    /// Filename of glove format pre-trained embedding
    #[arg(long, value_name = "FILE")]
    glove: Option<PathBuf>,
    /// A question is correct if the answer is among this many nearest words
    #[arg(long, default_value_t = 1)]
    top_k: usize,
    #[arg(short, long, default_value_t = 2)]
    verbose: i32,
}

/// Prompt and read one trimmed line, `None` at end of input.
fn get_input(prompt: &str) -> io::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut s = String::new();
    if io::stdin().read_line(&mut s)? == 0 {
        return Ok(None);
    }
    Ok(Some(s.trim().to_string()))
}

/// Group selection menu for one corpus. Returns false when input has ended.
fn select_groups(
    corpus: &AnalogyCorpus,
    models: &[NamedModel],
    evaluator: &Evaluator,
) -> io::Result<bool> {
    loop {
        println!("\nFollowing groups are found in the file.");
        for (index, name) in corpus.group_names().enumerate() {
            println!("{}. {name}", index + 1);
        }

        let Some(s) = get_input("Enter the group index to test for accuracy, or 0 to exit: ")?
        else {
            return Ok(false);
        };
        let Ok(index) = s.parse::<usize>() else {
            println!("Invalid index, please try again");
            continue;
        };
        if index == 0 {
            return Ok(true);
        }
        let Some(group) = corpus.get(index - 1) else {
            println!("Invalid index, please try again");
            continue;
        };

        for model in models {
            let result = evaluator.evaluate(group, &model.vectors);
            println!(
                "Accuracy of {} embedding for {} group is {:.2}%",
                model.label,
                group.name(),
                result.accuracy()
            );
        }

        if get_input("Press enter key to continue..")?.is_none() {
            return Ok(false);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    if cli.w2v.is_none() && cli.glove.is_none() {
        println!("Provide at least one embedding file");
        Cli::command().print_help()?;
        return Ok(());
    }

    let evaluator = Evaluator::new(cli.top_k)?;
    let models = load_models(cli.w2v.as_deref(), cli.glove.as_deref())?;

    loop {
        let Some(input_filename) = get_input("Enter input filename (EXIT to quit): ")? else {
            break;
        };
        if input_filename.is_empty() || input_filename == "EXIT" {
            break;
        }

        let corpus = match AnalogyCorpus::from_file(&input_filename) {
            Ok(corpus) => corpus,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        if corpus.is_empty() {
            println!("No groups found in the given file. Please check and try again!");
            continue;
        }

        if !select_groups(&corpus, &models, &evaluator)? {
            break;
        }
    }

    println!("Goodbye!");
    Ok(())
}
