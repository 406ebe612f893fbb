use std::io::{self, Write};

use clap::Parser;
use tokio::time::Duration;
use tracing::debug;

use expiremap_common::{DEFAULT_REAP_INTERVAL, DEFAULT_TTL};
use expiremap_storage::StoreConfig;

mod command;

use command::{Command, Store, format_reply};

#[derive(Parser, Debug)]
#[command(name = "expiremap-cli", about = "REPL sobre um ExpiringStore em memória")]
struct Args {
    /// Intervalo entre varreduras de entradas expiradas, em ms
    #[arg(long, default_value_t = DEFAULT_REAP_INTERVAL.as_millis() as u64)]
    reap_interval_ms: u64,
    /// TTL aplicado quando SET não informa um, em ms
    #[arg(long, default_value_t = DEFAULT_TTL.as_millis() as u64)]
    default_ttl_ms: u64,

    /// Comandos para executar diretamente, separados por ";"
    /// (modo não interativo)
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "expiremap_storage=info,expiremap_cli=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = StoreConfig::new(
        Duration::from_millis(args.reap_interval_ms),
        Duration::from_millis(args.default_ttl_ms),
    );
    let store = Store::with_config(config)?;

    // Modo não interativo: comandos separados por ";"
    if !args.command.is_empty() {
        for tokens in split_commands(args.command) {
            execute_line(&store, tokens);
        }
        store.shutdown().await;
        return Ok(());
    }

    println!("TTL padrão {:?}, varredura a cada {:?}", config.default_ttl, config.reap_interval);

    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        print!("expiremap> ");
        io::stdout().flush()?;

        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break; // EOF
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let tokens = tokenize(line);
        if tokens.is_empty() {
            continue;
        }

        execute_line(&store, tokens);
    }

    store.shutdown().await;
    Ok(())
}

fn execute_line(store: &Store, tokens: Vec<String>) {
    match Command::from_tokens(tokens) {
        Ok(cmd) => {
            debug!("comando recebido: {cmd:?}");
            println!("{}", format_reply(&cmd.execute(store), 0));
        }
        Err(e) => println!("(error) {e}"),
    }
}

fn split_commands(args: Vec<String>) -> Vec<Vec<String>> {
    args.split(|arg| arg == ";")
        .filter(|tokens| !tokens.is_empty())
        .map(<[String]>::to_vec)
        .collect()
}

/// Tokeniza a linha de input com suporte a strings quoted.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut quote_char = '"';
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quote {
            if c == quote_char {
                in_quote = false;
            } else if c == '\\' {
                match chars.peek() {
                    Some(&'n') => current.push('\n'),
                    Some(&'t') => current.push('\t'),
                    Some(&next @ ('\\' | '"' | '\'')) => current.push(next),
                    _ => {
                        current.push(c);
                        continue;
                    }
                }
                chars.next();
            } else {
                current.push(c);
            }
        } else if c == '"' || c == '\'' {
            in_quote = true;
            quote_char = c;
        } else if c.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}
