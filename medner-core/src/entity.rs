//! # Entidades Clínicas e seus Rótulos
//!
//! Uma entidade é um intervalo de bytes `[start, end)` sobre o texto original
//! com um rótulo e uma confiança. O texto da entidade **não é armazenado**:
//! é sempre derivado dos offsets, então nunca fica dessincronizado.
//!
//! ## Rótulos Conhecidos
//!
//! | Rótulo     | Significado                | Origem típica | Exemplos              |
//! |------------|----------------------------|---------------|-----------------------|
//! | CHEMICAL   | Medicamento / substância   | modelo        | Aspirin, Metformin    |
//! | DISEASE    | Doença / condição          | modelo        | diabetes, hypertension|
//! | DOSAGE     | Dose (número + unidade)    | padrão regex  | 500mg, 10 ml, 3x daily|
//!
//! Qualquer outro rótulo passa adiante sem modificação ([`EntityLabel::Other`]).

use serde::{Deserialize, Serialize};

use crate::error::{NerError, Result};

/// Rótulo de uma entidade.
///
/// O conjunto é aberto: o modelo e o motor de padrões evoluem de forma
/// independente, então rótulos desconhecidos são preservados como texto.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityLabel {
    /// **Medicamento**: nomes de drogas e substâncias químicas. Ex: "Aspirin".
    Chemical,
    /// **Doença**: diagnósticos e condições. Ex: "type 2 diabetes".
    Disease,
    /// **Dosagem**: número seguido de unidade. Ex: "850 mg", "3x daily".
    Dosage,
    /// Qualquer outro grupo emitido por uma fonte externa.
    Other(String),
}

impl EntityLabel {
    /// Nome canônico do rótulo (para serialização e UI)
    pub fn name(&self) -> &str {
        match self {
            EntityLabel::Chemical => "CHEMICAL",
            EntityLabel::Disease => "DISEASE",
            EntityLabel::Dosage => "DOSAGE",
            EntityLabel::Other(s) => s.as_str(),
        }
    }

    /// Cor CSS para highlight na UI
    pub fn color(&self) -> &'static str {
        match self {
            EntityLabel::Chemical => "#3b82f6", // azul
            EntityLabel::Disease => "#ef4444",  // vermelho
            EntityLabel::Dosage => "#10b981",   // verde
            EntityLabel::Other(_) => "#8b5cf6", // violeta
        }
    }

    /// Ícone emoji para o rótulo
    pub fn icon(&self) -> &'static str {
        match self {
            EntityLabel::Chemical => "💊",
            EntityLabel::Disease => "🩺",
            EntityLabel::Dosage => "⚖️",
            EntityLabel::Other(_) => "🔖",
        }
    }

    /// Parseia um grupo de entidade (ex: "Chemical" → `Chemical`).
    ///
    /// Rótulos conhecidos são reconhecidos sem diferenciar maiúsculas;
    /// o restante vira `Other` com o texto original intacto.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "CHEMICAL" => EntityLabel::Chemical,
            "DISEASE" => EntityLabel::Disease,
            "DOSAGE" => EntityLabel::Dosage,
            _ => EntityLabel::Other(s.to_string()),
        }
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<&str> for EntityLabel {
    fn from(s: &str) -> Self {
        EntityLabel::parse(s)
    }
}

impl Serialize for EntityLabel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for EntityLabel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(EntityLabel::parse(&s))
    }
}

/// De onde veio a entidade. Informativo: a prioridade é a ordem de chegada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityOrigin {
    /// Classificador de tokens (modelo estatístico)
    Model,
    /// Motor de padrões (regex de dosagem)
    Pattern,
}

/// Uma entidade identificada no texto.
///
/// Registro imutável criado a cada chamada. Os offsets são **bytes** sobre o
/// texto UTF-8 original, no intervalo semiaberto `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Rótulo da entidade
    pub label: EntityLabel,
    /// Confiança no intervalo [0.0, 1.0]
    pub score: f64,
    /// Posição de byte inicial no texto original (inclusiva)
    pub start: usize,
    /// Posição de byte final no texto original (exclusiva)
    pub end: usize,
    /// Fonte que produziu a entidade
    pub origin: EntityOrigin,
}

impl Entity {
    /// Cria uma entidade; o score é limitado a [0.0, 1.0] (NaN vira 0.0).
    pub fn new(label: impl Into<EntityLabel>, score: f64, start: usize, end: usize, origin: EntityOrigin) -> Self {
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
        Self {
            label: label.into(),
            score,
            start,
            end,
            origin,
        }
    }

    /// Entidade vinda do modelo.
    pub fn from_model(label: impl Into<EntityLabel>, score: f64, start: usize, end: usize) -> Self {
        Self::new(label, score, start, end, EntityOrigin::Model)
    }

    /// Entidade vinda de um padrão: confiança máxima por convenção.
    pub fn from_pattern(label: impl Into<EntityLabel>, start: usize, end: usize) -> Self {
        Self::new(label, 1.0, start, end, EntityOrigin::Pattern)
    }

    /// Tamanho do intervalo em bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Texto coberto pela entidade, derivado dos offsets.
    ///
    /// Retorna `None` se os offsets não forem válidos para `source`.
    pub fn text<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start..self.end)
    }

    /// Valida os offsets contra o texto de origem.
    ///
    /// Offsets vêm de fontes externas e são tratados como não confiáveis:
    /// `start < end <= len(source)` e ambos em fronteira de `char`.
    pub fn validate(&self, source: &str) -> Result<()> {
        let malformed = |reason| NerError::MalformedEntity {
            start: self.start,
            end: self.end,
            text_len: source.len(),
            reason,
        };

        if self.start >= self.end {
            return Err(malformed("start >= end"));
        }
        if self.end > source.len() {
            return Err(malformed("end além do fim do texto"));
        }
        if !source.is_char_boundary(self.start) || !source.is_char_boundary(self.end) {
            return Err(malformed("offset fora de fronteira UTF-8"));
        }
        Ok(())
    }
}
