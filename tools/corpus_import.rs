/// Corpus Import — loads a plain text log into the chat corpus.
///
/// Usage: corpus_import --input <file.txt> --scope <#channel> [--db <ai.sqlite>]
///
/// Each line is trimmed and filtered the same way live chat is; lines
/// already in the corpus are skipped.
use chatter::core::corpus::{CorpusStore, SqliteCorpus};
use chatter::core::filter::should_ignore;
use std::process;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    let mut input = None;
    let mut scope = None;
    let mut db = String::from("data/ai.sqlite");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--input" if i + 1 < args.len() => {
                i += 1;
                input = Some(args[i].clone());
            }
            "--scope" if i + 1 < args.len() => {
                i += 1;
                scope = Some(args[i].clone());
            }
            "--db" if i + 1 < args.len() => {
                i += 1;
                db = args[i].clone();
            }
            "--help" | "-h" => {
                println!("Usage: corpus_import --input <file.txt> --scope <#channel> [--db <ai.sqlite>]");
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let input_path = input.unwrap_or_else(|| {
        eprintln!("Error: --input is required");
        process::exit(1);
    });
    let scope = scope.unwrap_or_else(|| {
        eprintln!("Error: --scope is required");
        process::exit(1);
    });

    let text = std::fs::read_to_string(&input_path).unwrap_or_else(|e| {
        eprintln!("Error reading input file '{}': {}", input_path, e);
        process::exit(1);
    });

    let store = SqliteCorpus::open(&db).unwrap_or_else(|e| {
        eprintln!("Error opening corpus '{}': {}", db, e);
        process::exit(1);
    });

    let (mut added, mut duplicate, mut ignored) = (0usize, 0usize, 0usize);
    for line in text.lines() {
        let line = line.trim();
        if should_ignore(line) {
            ignored += 1;
            continue;
        }
        match store.add_line(line, &scope) {
            Ok(true) => added += 1,
            Ok(false) => duplicate += 1,
            Err(e) => {
                eprintln!("Error writing to corpus: {}", e);
                process::exit(1);
            }
        }
    }

    println!(
        "Imported {} lines into {} ({} duplicates, {} ignored)",
        added, scope, duplicate, ignored
    );
    match (store.count(None), store.count(Some(&scope))) {
        (Ok(global), Ok(scoped)) => println!("Corpus now holds {} lines, {} from {}", global, scoped, scope),
        (Err(e), _) | (_, Err(e)) => eprintln!("Error counting corpus: {}", e),
    }
}
