use analogy_eval::{EmbeddingLookup, NamedModel, load_models, logging};
use clap::{CommandFactory, Parser};
use std::io::{self, Write};
use std::path::PathBuf;

const TEST_WORDS: [&str; 6] = ["accept", "combine", "increase", "give", "open", "scatter"];

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Lists the nearest words in Word2Vec and/or GloVe embeddings.",
    long_about = None
)]
struct Cli {
    /// Filename of word2vec format pre-trained embedding, binary if the extension is .bin
    #[arg(long, value_name = "FILE")]
    w2v: Option<PathBuf>,
    /// Filename of glove format pre-trained embedding
    #[arg(long, value_name = "FILE")]
    glove: Option<PathBuf>,
    /// Words to look up, defaults to a fixed list of verbs
    #[arg(long, num_args = 1.., value_name = "WORD")]
    words: Vec<String>,
    #[arg(long, default_value_t = 10)]
    top_n: usize,
    /// Keep asking for words (or sums of words) on stdin
    #[arg(short, long)]
    interactive: bool,
    #[arg(short, long, default_value_t = 2)]
    verbose: i32,
}

fn get_input() -> io::Result<Option<String>> {
    let mut s = String::new();
    if io::stdin().read_line(&mut s)? == 0 {
        return Ok(None);
    }
    Ok(Some(s.trim().to_string()))
}

fn list_similar(models: &[NamedModel], words: &[String], top_n: usize) {
    for model in models {
        for word in words {
            match model.vectors.similar_by_word(word, top_n) {
                Ok(similar) => {
                    let similar: Vec<&str> = similar.iter().map(|(w, _)| w.as_str()).collect();
                    println!("Words similar to {word} as per {} embeddings are:", model.label);
                    println!("{similar:?}");
                }
                Err(e) => println!("{}: {e}", model.label),
            }
        }
    }
}

fn interactive(models: &[NamedModel], top_n: usize) -> io::Result<()> {
    println!("Near Words Tool - Type 'EXIT' to quit\n");
    loop {
        println!("\nRanking nearest words to a word or sentence.");
        print!("Enter 1 or more words: ");
        io::stdout().flush()?;
        let Some(s) = get_input()? else {
            break;
        };
        if s == "EXIT" {
            println!("Goodbye!");
            break;
        }
        let words: Vec<&str> = s.split_whitespace().collect();
        if words.is_empty() {
            println!("No words were input. Try again");
            continue;
        }

        for model in models {
            let topn = match model.vectors.most_similar(&words, &[], top_n) {
                Ok(topn) => topn,
                Err(e) => {
                    println!("{}: {e}", model.label);
                    continue;
                }
            };

            println!("\n{} nearest words to '{}':", model.label, words.join(" + "));
            println!("{:>4} {:>10} Word", "Rank", "Score");
            println!("{}", "-".repeat(30));
            for (i, (word, score)) in topn.iter().enumerate() {
                println!("{:4}: {:10.6} {}", i + 1, score, word);
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    if cli.w2v.is_none() && cli.glove.is_none() {
        println!("Provide at least one embedding file");
        Cli::command().print_help()?;
        return Ok(());
    }

    let models = load_models(cli.w2v.as_deref(), cli.glove.as_deref())?;
    if cli.interactive {
        interactive(&models, cli.top_n)?;
    } else {
        let words = if cli.words.is_empty() {
            TEST_WORDS.iter().map(|w| w.to_string()).collect()
        } else {
            cli.words
        };
        list_similar(&models, &words, cli.top_n);
    }
    Ok(())
}
