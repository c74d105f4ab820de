//! # Tokenizador para Notas Clínicas
//!
//! Divide o texto em palavras preservando a posição original (offset em bytes)
//! de cada uma, para que as entidades possam ser destacadas sem alterar a
//! formatação da nota.
//!
//! Usa as fronteiras de palavra do Unicode (UAX #29) via `unicode-segmentation`
//! e descarta os trechos sem nenhum caractere alfanumérico (espaços e pontuação).
//! Assim "500mg" continua um único token e "type-2" vira "type", "2".

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Um token extraído do texto original.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    /// O texto do token (ex: "Metformin", "850").
    pub text: String,
    /// Índice de byte inicial no texto original (inclusive).
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo).
    pub end: usize,
}

impl Token {
    /// Forma normalizada usada nas buscas em gazetteer
    pub fn lower(&self) -> String {
        self.text.to_lowercase()
    }
}

/// Tokeniza um texto em palavras.
pub fn tokenize(text: &str) -> Vec<Token> {
    text.split_word_bound_indices()
        .filter(|(_, w)| w.chars().any(char::is_alphanumeric))
        .map(|(start, w)| Token {
            text: w.to_string(),
            start,
            end: start + w.len(),
        })
        .collect()
}
