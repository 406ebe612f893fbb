use bytes::Bytes;
use tokio::time::Duration;

use expiremap_common::CommandError;
use expiremap_storage::ExpiringStore;

/// Store usado pela CLI.
pub type Store = ExpiringStore<String, Bytes>;

/// Comandos aceitos pelo REPL.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set {
        key: String,
        value: Bytes,
        ttl: Option<Duration>,
    },
    Get(String),
    Load(String),
    GetOrSet {
        key: String,
        value: Bytes,
        ttl: Option<Duration>,
    },
    GetDel(String),
    Del(Vec<String>),
    Scan,
    Len,
    Purge,
}

/// Resposta de um comando, formatada para exibição humana.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ok,
    Bulk(Bytes),
    Null,
    Integer(i64),
    Array(Vec<Reply>),
}

/// Cursor sobre os tokens de uma linha.
struct Parse {
    name: String,
    tokens: std::vec::IntoIter<String>,
}

impl Parse {
    fn next_string(&mut self) -> Result<String, CommandError> {
        self.tokens
            .next()
            .ok_or_else(|| CommandError::WrongArity(self.name.clone()))
    }

    fn next_bytes(&mut self) -> Result<Bytes, CommandError> {
        self.next_string().map(Bytes::from)
    }

    /// TTL opcional em milissegundos no fim da linha.
    fn optional_ttl(&mut self) -> Result<Option<Duration>, CommandError> {
        match self.tokens.next() {
            None => Ok(None),
            Some(s) => s
                .parse::<u64>()
                .map(|ms| Some(Duration::from_millis(ms)))
                .map_err(|_| CommandError::InvalidArgument(format!("'{s}' não é um TTL em ms"))),
        }
    }

    fn has_remaining(&self) -> bool {
        self.tokens.len() > 0
    }

    fn finish(&self) -> Result<(), CommandError> {
        if self.has_remaining() {
            return Err(CommandError::WrongArity(self.name.clone()));
        }
        Ok(())
    }
}

impl Command {
    /// Faz o parse de uma linha já tokenizada.
    pub fn from_tokens(tokens: Vec<String>) -> Result<Command, CommandError> {
        let mut tokens = tokens.into_iter();
        let name = tokens
            .next()
            .ok_or_else(|| CommandError::InvalidArgument("linha vazia".into()))?
            .to_uppercase();
        let mut parse = Parse {
            name: name.clone(),
            tokens,
        };

        let cmd = match name.as_str() {
            "SET" => {
                let key = parse.next_string()?;
                let value = parse.next_bytes()?;
                let ttl = parse.optional_ttl()?;
                parse.finish()?;
                Command::Set { key, value, ttl }
            }
            "GETORSET" => {
                let key = parse.next_string()?;
                let value = parse.next_bytes()?;
                let ttl = parse.optional_ttl()?;
                parse.finish()?;
                Command::GetOrSet { key, value, ttl }
            }
            "GET" => {
                let key = parse.next_string()?;
                parse.finish()?;
                Command::Get(key)
            }
            "LOAD" => {
                let key = parse.next_string()?;
                parse.finish()?;
                Command::Load(key)
            }
            "GETDEL" => {
                let key = parse.next_string()?;
                parse.finish()?;
                Command::GetDel(key)
            }
            "DEL" => {
                if !parse.has_remaining() {
                    return Err(CommandError::WrongArity("DEL".into()));
                }
                let mut keys = Vec::new();
                while parse.has_remaining() {
                    keys.push(parse.next_string()?);
                }
                Command::Del(keys)
            }
            "SCAN" => {
                parse.finish()?;
                Command::Scan
            }
            "LEN" => {
                parse.finish()?;
                Command::Len
            }
            "PURGE" => {
                parse.finish()?;
                Command::Purge
            }
            _ => return Err(CommandError::Unknown(name)),
        };

        Ok(cmd)
    }

    /// Executa o comando contra o store.
    pub fn execute(self, store: &Store) -> Reply {
        match self {
            Command::Set { key, value, ttl } => {
                match ttl {
                    Some(ttl) => store.set_with_ttl(key, value, ttl),
                    None => store.set(key, value),
                }
                Reply::Ok
            }
            Command::Get(key) => bulk_or_null(store.get(&key)),
            Command::Load(key) => bulk_or_null(store.load(&key)),
            Command::GetOrSet { key, value, ttl } => {
                let (value, existed) = match ttl {
                    Some(ttl) => store.load_or_store_with_ttl(key, value, ttl),
                    None => store.load_or_store(key, value),
                };
                Reply::Array(vec![Reply::Bulk(value), Reply::Integer(existed as i64)])
            }
            Command::GetDel(key) => bulk_or_null(store.load_and_delete(&key)),
            Command::Del(keys) => {
                for key in &keys {
                    store.delete(key);
                }
                Reply::Ok
            }
            Command::Scan => {
                let mut items = Vec::new();
                store.range(|key, value| {
                    items.push(Reply::Bulk(Bytes::from(key.clone())));
                    items.push(Reply::Bulk(value.clone()));
                    true
                });
                Reply::Array(items)
            }
            Command::Len => Reply::Integer(store.len() as i64),
            Command::Purge => {
                let stats = store.purge_expired();
                Reply::Array(vec![
                    Reply::Integer(stats.entries as i64),
                    Reply::Integer(stats.keys as i64),
                ])
            }
        }
    }
}

fn bulk_or_null(value: Option<Bytes>) -> Reply {
    value.map(Reply::Bulk).unwrap_or(Reply::Null)
}

/// Formata uma resposta para exibição humana.
pub fn format_reply(reply: &Reply, indent: usize) -> String {
    let pad = " ".repeat(indent);
    match reply {
        Reply::Ok => format!("{pad}OK"),
        Reply::Integer(n) => format!("{pad}(integer) {n}"),
        Reply::Bulk(data) => match std::str::from_utf8(data) {
            Ok(s) => format!("{pad}\"{s}\""),
            Err(_) => format!("{pad}(binary) {} bytes", data.len()),
        },
        Reply::Null => format!("{pad}(nil)"),
        Reply::Array(replies) => {
            if replies.is_empty() {
                return format!("{pad}(empty array)");
            }
            let mut lines = Vec::new();
            for (i, r) in replies.iter().enumerate() {
                lines.push(format!("{pad}{}) {}", i + 1, format_reply(r, 0)));
            }
            lines.join("\n")
        }
    }
}
