/// Erros de configuração do store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("intervalo de limpeza deve ser positivo")]
    ZeroReapInterval,
    #[error("TTL padrão deve ser positivo")]
    ZeroDefaultTtl,
}

/// Erros de construção do store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("nenhum runtime tokio disponível para a task de limpeza")]
    NoRuntime,
}

/// Erros de parsing/validação de comandos da CLI.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("comando desconhecido: {0}")]
    Unknown(String),
    #[error("número errado de argumentos para '{0}'")]
    WrongArity(String),
    #[error("argumento inválido: {0}")]
    InvalidArgument(String),
}

/// Result type alias.
pub type StoreResult<T> = Result<T, StoreError>;
