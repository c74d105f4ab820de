//! # Motor de Padrões — Dosagens
//!
//! Complementa o modelo com conhecimento explícito: uma dose é um número
//! (inteiro ou decimal), um espaço opcional e uma unidade de um vocabulário
//! fixo. Cada ocorrência vira uma entidade `DOSAGE` com confiança 1.0.
//!
//! ## Padrão
//!
//! ```text
//! (?i)\d+(\.\d+)?\s?(mg|g|ml|mcg|L|oz|tablet|tabs|capsule|cap|pills|daily|x daily)
//! ```
//!
//! A alternância é *leftmost-first*: a ordem do vocabulário importa.
//! Em "500 mcg", `mg` e `g` falham no primeiro caractere e `mcg` casa;
//! em "2 caps", `capsule` falha e `cap` casa (o "s" fica de fora).

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::entity::{Entity, EntityLabel};
use crate::error::{NerError, Result};
use crate::source::EntitySource;

/// Vocabulário padrão de unidades, na ordem em que são tentadas.
pub const DEFAULT_UNITS: &[&str] = &[
    "mg", "g", "ml", "mcg", "L", "oz", "tablet", "tabs", "capsule", "cap", "pills", "daily",
    "x daily",
];

static DEFAULT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let units: Vec<String> = DEFAULT_UNITS.iter().map(|s| s.to_string()).collect();
    Regex::new(&build_pattern(&units)).expect("padrão de dosagem padrão é válido")
});

fn build_pattern(units: &[String]) -> String {
    let alternation = units
        .iter()
        .map(|u| regex::escape(u))
        .collect::<Vec<_>>()
        .join("|");
    format!(r"(?i)\d+(?:\.\d+)?\s?(?:{alternation})")
}

/// Fonte de entidades baseada em padrões de dosagem.
#[derive(Debug, Clone)]
pub struct DosagePatternSource {
    regex: Regex,
}

impl DosagePatternSource {
    /// Fonte com o vocabulário padrão ([`DEFAULT_UNITS`]).
    pub fn new() -> Self {
        Self {
            regex: DEFAULT_PATTERN.clone(),
        }
    }

    /// Fonte com vocabulário customizado. As unidades são escapadas e
    /// mantêm a ordem recebida; unidades em branco são ignoradas.
    pub fn with_units<S: AsRef<str>>(units: &[S]) -> Result<Self> {
        let units: Vec<String> = units
            .iter()
            .map(|u| u.as_ref().trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        if units.is_empty() {
            return Err(NerError::InvalidPattern(
                "vocabulário de unidades vazio".to_string(),
            ));
        }

        let regex = Regex::new(&build_pattern(&units))?;
        Ok(Self { regex })
    }

    /// Encontra todas as dosagens do texto, em ordem de ocorrência.
    pub fn find(&self, text: &str) -> Vec<Entity> {
        let entities: Vec<Entity> = self
            .regex
            .find_iter(text)
            .map(|m| Entity::from_pattern(EntityLabel::Dosage, m.start(), m.end()))
            .collect();
        debug!(count = entities.len(), "dosagens encontradas");
        entities
    }
}

impl Default for DosagePatternSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EntitySource for DosagePatternSource {
    fn name(&self) -> &str {
        "dosage_pattern"
    }

    fn extract(&self, text: &str) -> Result<Vec<Entity>> {
        Ok(self.find(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(text: &str) -> Vec<&str> {
        DosagePatternSource::new()
            .find(text)
            .iter()
            .filter_map(|e| e.text(text))
            .collect()
    }

    #[test]
    fn test_basic_dosages() {
        assert_eq!(matches("Take 500mg Aspirin daily"), vec!["500mg"]);
        assert_eq!(matches("Inject 10ml of Insulin"), vec!["10ml"]);
        assert_eq!(matches("Lisinopril 10 mg daily"), vec!["10 mg"]);
    }

    #[test]
    fn test_decimal_and_case_insensitive() {
        assert_eq!(matches("give 2.5 ML now"), vec!["2.5 ML"]);
        assert_eq!(matches("1.5L saline"), vec!["1.5L"]);
    }

    #[test]
    fn test_times_daily() {
        assert_eq!(matches("500mg Amoxicillin 3x daily"), vec!["500mg", "3x daily"]);
    }

    #[test]
    fn test_alternation_order() {
        assert_eq!(matches("200 mcg"), vec!["200 mcg"]);
        assert_eq!(matches("2 caps"), vec!["2 cap"]);
        assert_eq!(matches("1 capsule"), vec!["1 capsule"]);
        assert_eq!(matches("3 tablets"), vec!["3 tablet"]);
    }

    #[test]
    fn test_word_without_number_is_ignored() {
        // "daily" só conta quando precedido de número
        assert!(matches("Take Aspirin daily").is_empty());
    }

    #[test]
    fn test_entity_shape() {
        let text = "Take 500mg Aspirin";
        let found = DosagePatternSource::new().find(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, EntityLabel::Dosage);
        assert_eq!(found[0].score, 1.0);
        assert_eq!((found[0].start, found[0].end), (5, 10));
    }

    #[test]
    fn test_custom_units_are_escaped() {
        let source = DosagePatternSource::with_units(&["UI", "gtt."]).unwrap();
        let text = "10 UI e 5 gtt. e 5 gtts";
        let found: Vec<&str> = source.find(text).iter().filter_map(|e| e.text(text)).collect();
        assert_eq!(found, vec!["10 UI", "5 gtt."]);
    }

    #[test]
    fn test_empty_vocabulary_is_rejected() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            DosagePatternSource::with_units(&empty),
            Err(NerError::InvalidPattern(_))
        ));
        assert!(DosagePatternSource::with_units(&["  "]).is_err());
    }

    #[test]
    fn test_extract_through_source_trait() {
        let source: &dyn EntitySource = &DosagePatternSource::new();
        let text = "Inject 10ml of Insulin";
        let found = source.extract(text).unwrap();
        assert_eq!(source.name(), "dosage_pattern");
        assert_eq!(found, DosagePatternSource::new().find(text));
    }

    #[test]
    fn test_with_default_units_matches_new() {
        let custom = DosagePatternSource::with_units(DEFAULT_UNITS).unwrap();
        let text = "Metformin 850 mg and 2 tabs 3x daily, 1 oz";
        assert_eq!(custom.find(text), DosagePatternSource::new().find(text));
    }
}
