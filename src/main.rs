//! CLI tool to validate and inspect dotenv files.

use std::fs::File;
use std::process::ExitCode;

use envfile_rs::{Encoding, LexOptions, parse_file, tokenize_reader};
use log::debug;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        eprintln!("Usage: envfile <command> [args...]");
        eprintln!();
        eprintln!("Commands:");
        eprintln!("  validate <files...>     Check if dotenv file(s) parse");
        eprintln!("  tokens <files...>       Print the token stream of dotenv file(s)");
        eprintln!("  get <KEY> <files...>    Print the value of KEY from each file");
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  envfile validate .env");
        eprintln!("  envfile tokens .env");
        eprintln!("  envfile get DATABASE_URL .env .env.local");
        return ExitCode::from(2);
    }

    let command = args[1].as_str();
    let (key, files) = match command {
        "get" => match args.get(2) {
            Some(key) => (Some(key.as_str()), &args[3..]),
            None => {
                eprintln!("Error: no key specified");
                return ExitCode::from(2);
            }
        },
        "validate" | "tokens" => (None, &args[2..]),
        _ => {
            eprintln!("Unknown command: {command}");
            return ExitCode::from(2);
        }
    };

    if files.is_empty() {
        eprintln!("Error: no files specified");
        return ExitCode::from(2);
    }

    let mut had_error = false;

    for path in files {
        debug!("{command}: {path}");
        let ok = match command {
            "validate" => validate(path),
            "tokens" => print_tokens(path),
            _ => key.is_some_and(|key| print_value(path, key)),
        };
        had_error |= !ok;
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn validate(path: &str) -> bool {
    match parse_file(path, Encoding::Utf8) {
        Ok(env) => {
            eprintln!("{path}: valid ({} variable(s))", env.len());
            true
        }
        Err(e) => {
            eprintln!("{path}: {e}");
            false
        }
    }
}

fn print_tokens(path: &str) -> bool {
    let tokens = File::open(path)
        .map_err(envfile_rs::Error::from)
        .and_then(|file| tokenize_reader(file, Encoding::Utf8, LexOptions::new()));
    match tokens {
        Ok(tokens) => {
            for token in tokens {
                println!("{} {} {:?}", token.position, token.kind, token.text);
            }
            true
        }
        Err(e) => {
            eprintln!("{path}: {e}");
            false
        }
    }
}

fn print_value(path: &str, key: &str) -> bool {
    match parse_file(path, Encoding::Utf8) {
        Ok(env) => {
            if let Some(value) = env.get(key) {
                println!("{value}");
                true
            } else {
                eprintln!("{path}: {key} is not set");
                false
            }
        }
        Err(e) => {
            eprintln!("{path}: {e}");
            false
        }
    }
}
