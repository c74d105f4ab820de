//! # Erros do Pipeline Clínico
//!
//! Apenas violações de contrato que não podem ser ignoradas viram erro.
//! Fonte indisponível e texto vazio são tratados por omissão: o pipeline
//! sempre entrega uma segmentação completa do texto.

use thiserror::Error;

/// Erros produzidos pelo `medner-core`.
#[derive(Debug, Error)]
pub enum NerError {
    /// O modelo de classificação não existe ou falhou na inferência.
    /// Recuperado localmente pela [`crate::source::ModelSource`] (conjunto vazio).
    #[error("fonte '{source_name}' indisponível: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// Entidade com offsets impossíveis para o texto de origem.
    #[error("entidade malformada [{start}..{end}) em texto de {text_len} bytes: {reason}")]
    MalformedEntity {
        start: usize,
        end: usize,
        text_len: usize,
        reason: &'static str,
    },

    /// O segmentador recebeu entidades não reconciliadas.
    #[error("entidade iniciando em {start} sobrepõe a anterior (cursor em {cursor})")]
    Overlap { start: usize, cursor: usize },

    /// Vocabulário de unidades customizado vazio ou que gera uma regex inválida.
    #[error("padrão de dosagem inválido: {0}")]
    InvalidPattern(String),

    /// Arquivo de gazetteer com JSON inválido.
    #[error("gazetteer inválido: {0}")]
    Gazetteer(#[from] serde_json::Error),
}

impl From<regex::Error> for NerError {
    fn from(e: regex::Error) -> Self {
        NerError::InvalidPattern(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NerError>;
