/// Chat console — feed chat lines through the bot from a terminal.
///
/// Usage: chat_console [--config <file.ron>] [--data-dir <path>] [--nick <nick>] [--seed <n>]
///
/// Input lines:
///   <nick> <#scope> <text...>   — a chat line; `!ai` and `!ai --status` run the command
///   op <#scope> <nick>          — grant operator mode to a nick
///   deop <#scope> <nick>        — revoke operator mode
///   help                        — list commands
///   quit                        — exit
use chatter::core::config::ChatConfig;
use chatter::core::pipeline::{Chatbot, LineOutcome, ReplySink};
use chatter::core::privilege::ChannelModes;
use chatter::schema::line::ChatLine;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Prints replies as they would appear in the channel.
struct ConsoleSink<'a> {
    nick: &'a str,
}

impl ReplySink for ConsoleSink<'_> {
    fn send_reply(&mut self, scope: &str, text: &str) {
        println!("[{}] <{}> {}", scope, self.nick, text);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    let mut config_path = None;
    let mut data_dir = None;
    let mut nick = None;
    let mut seed = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--data-dir" if i + 1 < args.len() => {
                i += 1;
                data_dir = Some(PathBuf::from(&args[i]));
            }
            "--nick" if i + 1 < args.len() => {
                i += 1;
                nick = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse::<u64>().ok();
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(ref path) => ChatConfig::load(Path::new(path)).unwrap_or_else(|e| {
            eprintln!("Error loading config '{}': {}", path, e);
            std::process::exit(1);
        }),
        None => ChatConfig::default(),
    };
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    if let Some(nick) = nick {
        config.nick = nick;
    }

    let mut builder = Chatbot::builder().config(config);
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }
    let mut bot = builder.build().unwrap_or_else(|e| {
        eprintln!("Error opening stores: {}", e);
        std::process::exit(1);
    });

    let bot_nick = bot.config().nick.clone();
    println!(
        "Chatting as '{}' with data in {}",
        bot_nick,
        bot.config().data_dir.display()
    );
    println!("Type 'help' for commands.\n");

    let mut modes = ChannelModes::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("chat> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.splitn(3, char::is_whitespace).collect();
        match parts[0] {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "op" | "deop" if parts.len() == 3 => {
                let (scope, who) = (parts[1], parts[2].trim());
                if parts[0] == "op" {
                    modes.grant(scope, '@', who);
                    println!("{} is now an operator in {}", who, scope);
                } else {
                    modes.revoke(scope, '@', who);
                    println!("{} is no longer an operator in {}", who, scope);
                }
            }
            sender if parts.len() == 3 => {
                let chat = ChatLine::new(sender, parts[1], parts[2]);
                if let Some(show_status) = parse_ai_command(&chat.text) {
                    match bot.command(&chat.scope, &chat.sender, show_status, &modes) {
                        Ok(reply) => println!("[{}] <{}> {}", chat.scope, bot_nick, reply),
                        Err(e) => println!("ERROR: {}", e),
                    }
                    continue;
                }

                let mut sink = ConsoleSink { nick: &bot_nick };
                match bot.handle_line(&chat, &mut sink) {
                    LineOutcome::Replied | LineOutcome::FellBack => {}
                    outcome => println!("  ({:?})", outcome),
                }
            }
            _ => {
                println!("Expected '<nick> <#scope> <text>'. Type 'help' for commands.");
            }
        }
    }
}

/// `!ai` → `Some(false)`, `!ai --status` → `Some(true)`, anything else → `None`.
fn parse_ai_command(text: &str) -> Option<bool> {
    let mut words = text.split_whitespace();
    if words.next()? != "!ai" {
        return None;
    }
    match words.next() {
        None => Some(false),
        Some("--status") => Some(true),
        Some(_) => None,
    }
}

fn print_usage() {
    println!(
        "Usage: chat_console [--config <file.ron>] [--data-dir <path>] [--nick <nick>] [--seed <n>]"
    );
}

fn print_help() {
    println!("Commands:");
    println!("  <nick> <#scope> <text>   say something as <nick> in <#scope>");
    println!("  <nick> <#scope> !ai      toggle the bot in <#scope> (needs op)");
    println!("  <nick> <#scope> !ai --status");
    println!("  op <#scope> <nick>       grant operator mode");
    println!("  deop <#scope> <nick>     revoke operator mode");
    println!("  quit                     exit");
}
