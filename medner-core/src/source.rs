//! # Fontes de Entidades
//!
//! Duas fontes independentes alimentam o pipeline:
//! - [`ModelSource`]: o classificador de tokens (medicamentos e doenças);
//! - [`crate::dosage::DosagePatternSource`]: o motor de padrões (dosagens).
//!
//! O modelo é uma capacidade **opcional** injetada no construtor. Sem modelo,
//! a fonte entra em modo degradado e devolve um conjunto vazio; o pipeline
//! segue funcionando só com os padrões.

use std::sync::Arc;

use tracing::{debug, info};

use crate::classifier::TokenClassifier;
use crate::entity::{Entity, EntityLabel};
use crate::error::Result;

/// Produtor de entidades sobre um texto.
pub trait EntitySource: Send + Sync {
    /// Nome da fonte (para logs e eventos)
    fn name(&self) -> &str;

    /// Extrai entidades do texto. A ordem interna é preservada pelo pipeline
    /// e define a prioridade em empates de `start`.
    fn extract(&self, text: &str) -> Result<Vec<Entity>>;
}

/// Fonte baseada no modelo de classificação de tokens.
#[derive(Clone)]
pub struct ModelSource {
    classifier: Option<Arc<dyn TokenClassifier>>,
    min_score: f64,
}

impl ModelSource {
    /// Cria a fonte; `None` liga o modo degradado.
    pub fn new(classifier: Option<Arc<dyn TokenClassifier>>) -> Self {
        match &classifier {
            Some(c) => info!(model = c.name(), "modelo de classificação carregado"),
            None => info!("sem modelo de classificação: apenas padrões de dosagem"),
        }
        Self {
            classifier,
            min_score: 0.0,
        }
    }

    /// Descarta predições com score abaixo do limiar.
    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    /// Fonte sem modelo.
    pub fn unavailable() -> Self {
        Self::new(None)
    }

    pub fn is_available(&self) -> bool {
        self.classifier.is_some()
    }
}

impl std::fmt::Debug for ModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSource")
            .field("classifier", &self.classifier.as_ref().map(|c| c.name().to_string()))
            .field("min_score", &self.min_score)
            .finish()
    }
}

impl EntitySource for ModelSource {
    fn name(&self) -> &str {
        self.classifier.as_ref().map(|c| c.name()).unwrap_or("model")
    }

    fn extract(&self, text: &str) -> Result<Vec<Entity>> {
        let Some(classifier) = &self.classifier else {
            return Ok(Vec::new());
        };

        let predictions = classifier.classify(text)?;
        let total = predictions.len();
        let entities: Vec<Entity> = predictions
            .into_iter()
            .filter(|p| p.score >= self.min_score)
            .map(|p| Entity::from_model(EntityLabel::parse(&p.entity_group), p.score, p.start, p.end))
            .collect();

        debug!(
            model = classifier.name(),
            total,
            kept = entities.len(),
            "predições do modelo"
        );
        Ok(entities)
    }
}
