//! # Pipeline Clínico — Orquestrador com Eventos Observáveis
//!
//! O pipeline coordena as duas fontes, a validação de offsets, a reconciliação
//! e a segmentação, e emite eventos em cada passo via um canal Rust (`mpsc`),
//! permitindo que o servidor WebSocket transmita as decisões em tempo real.
//!
//! ## Fluxo
//!
//! 1. **Modelo**: medicamentos e doenças (pode estar ausente).
//! 2. **Padrões**: dosagens.
//! 3. **Validação**: entidades com offsets impossíveis são rejeitadas.
//! 4. **Reconciliação**: modelo antes do padrão; colisões são descartadas.
//! 5. **Segmentação**: cobertura completa do texto para a UI.

use std::sync::mpsc;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classifier::TokenClassifier;
use crate::dosage::{DosagePatternSource, DEFAULT_UNITS};
use crate::entity::Entity;
use crate::error::Result;
use crate::reconcile::{resolve, Discarded};
use crate::segment::{segment, Segment};
use crate::source::{EntitySource, ModelSource};

/// Configuração do pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Unidades de dosagem, na ordem de tentativa
    pub dosage_units: Vec<String>,
    /// Score mínimo para aceitar uma predição do modelo
    pub min_model_score: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dosage_units: DEFAULT_UNITS.iter().map(|s| s.to_string()).collect(),
            min_model_score: 0.0,
        }
    }
}

/// Entidade recusada na validação, com o motivo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedEntity {
    pub entity: Entity,
    pub reason: String,
}

/// Resultado completo de uma análise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Segmentos cobrindo o texto inteiro
    pub segments: Vec<Segment>,
    /// Entidades vencedoras, em ordem
    pub entities: Vec<Entity>,
    /// Entidades perdedoras em colisões
    pub discarded: Vec<Discarded>,
    /// Entidades com offsets inválidos
    pub rejected: Vec<RejectedEntity>,
    /// Se o modelo contribuiu nesta análise
    pub model_available: bool,
    pub processing_ms: u64,
}

/// Eventos emitidos pelo pipeline durante o processamento.
///
/// Permitem que a UI mostre cada decisão passo a passo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// **Passo 1**: entidades do modelo (vazio em modo degradado).
    ModelEntities {
        entities: Vec<Entity>,
        available: bool,
    },
    /// **Passo 1/2 (falha)**: uma fonte falhou; segue sem ela.
    SourceFailed { source: String, message: String },
    /// **Passo 2**: dosagens encontradas pelos padrões.
    PatternEntities { entities: Vec<Entity> },
    /// **Passo 3**: entidade recusada por offsets inválidos.
    EntityRejected { entity: Entity, reason: String },
    /// **Passo 4**: entidade aceita na reconciliação.
    EntityAccepted { entity: Entity, text: String },
    /// **Passo 4**: entidade descartada por colidir com uma já aceita.
    EntityDiscarded { entity: Entity, blocked_by: Entity },
    /// **Conclusão**: segmentação final.
    Done { analysis: Analysis },
    /// **Falha**: erro inesperado (a análise ainda é entregue em `Done`).
    Error { message: String },
}

/// O pipeline clínico principal.
///
/// Não guarda estado entre chamadas: pode ser compartilhado via `Arc` entre
/// requisições e usado em paralelo.
#[derive(Debug, Clone)]
pub struct ClinicalPipeline {
    model: ModelSource,
    dosage: DosagePatternSource,
}

impl ClinicalPipeline {
    /// Pipeline com configuração padrão.
    pub fn new(classifier: Option<Arc<dyn TokenClassifier>>) -> Self {
        Self {
            model: ModelSource::new(classifier),
            dosage: DosagePatternSource::new(),
        }
    }

    /// Pipeline configurado; falha apenas se o vocabulário de unidades for inválido.
    pub fn with_config(classifier: Option<Arc<dyn TokenClassifier>>, config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            model: ModelSource::new(classifier).with_min_score(config.min_model_score),
            dosage: DosagePatternSource::with_units(&config.dosage_units)?,
        })
    }

    /// Monta o pipeline a partir de fontes já construídas.
    pub fn from_sources(model: ModelSource, dosage: DosagePatternSource) -> Self {
        Self { model, dosage }
    }

    pub fn model_available(&self) -> bool {
        self.model.is_available()
    }

    /// Processa o texto de forma síncrona e retorna o resultado final.
    pub fn analyze(&self, text: &str) -> Analysis {
        let (tx, rx) = mpsc::channel();
        self.analyze_streaming(text, tx);

        let mut analysis = Analysis::default();
        while let Ok(event) = rx.recv() {
            if let PipelineEvent::Done { analysis: a } = event {
                analysis = a;
            }
        }
        analysis
    }

    /// Analisa vários textos em paralelo, preservando a ordem da entrada.
    pub fn analyze_batch<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<Analysis> {
        texts.par_iter().map(|t| self.analyze(t.as_ref())).collect()
    }

    /// Executa o pipeline enviando eventos de progresso pelo canal `tx`.
    ///
    /// # Fluxo de Eventos
    /// 1. `ModelEntities` (ou `SourceFailed` seguido de `ModelEntities` vazio)
    /// 2. `PatternEntities`
    /// 3. `EntityRejected` (loop)
    /// 4. `EntityAccepted` / `EntityDiscarded` (loop, em ordem de `start`)
    /// 5. `Done`
    pub fn analyze_streaming(&self, text: &str, tx: mpsc::Sender<PipelineEvent>) {
        let start = std::time::Instant::now();

        // === Passo 1: Modelo ===
        let mut model_ok = self.model.is_available();
        let model_entities = match self.model.extract(text) {
            Ok(entities) => entities,
            Err(e) => {
                warn!(source = self.model.name(), error = %e, "fonte indisponível, seguindo sem ela");
                let _ = tx.send(PipelineEvent::SourceFailed {
                    source: self.model.name().to_string(),
                    message: e.to_string(),
                });
                model_ok = false;
                Vec::new()
            }
        };
        let _ = tx.send(PipelineEvent::ModelEntities {
            entities: model_entities.clone(),
            available: model_ok,
        });

        // === Passo 2: Padrões ===
        let pattern_entities = match self.dosage.extract(text) {
            Ok(entities) => entities,
            Err(e) => {
                warn!(source = self.dosage.name(), error = %e, "fonte indisponível, seguindo sem ela");
                let _ = tx.send(PipelineEvent::SourceFailed {
                    source: self.dosage.name().to_string(),
                    message: e.to_string(),
                });
                Vec::new()
            }
        };
        let _ = tx.send(PipelineEvent::PatternEntities {
            entities: pattern_entities.clone(),
        });

        // === Passo 3: Validação (modelo primeiro: define a prioridade) ===
        let mut candidates = Vec::with_capacity(model_entities.len() + pattern_entities.len());
        let mut rejected = Vec::new();
        for entity in model_entities.into_iter().chain(pattern_entities) {
            match entity.validate(text) {
                Ok(()) => candidates.push(entity),
                Err(e) => {
                    warn!(label = %entity.label, start = entity.start, end = entity.end, error = %e, "entidade rejeitada");
                    let reason = e.to_string();
                    let _ = tx.send(PipelineEvent::EntityRejected {
                        entity: entity.clone(),
                        reason: reason.clone(),
                    });
                    rejected.push(RejectedEntity { entity, reason });
                }
            }
        }

        // === Passo 4: Reconciliação ===
        let reconciliation = resolve(candidates);
        let mut accepted = reconciliation.accepted.iter().peekable();
        let mut discarded = reconciliation.discarded.iter().peekable();
        // Intercala aceitos e descartados pela ordem de `start` para a UI
        loop {
            let take_accepted = match (accepted.peek(), discarded.peek()) {
                (Some(a), Some(d)) => a.start <= d.entity.start,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            if take_accepted {
                if let Some(entity) = accepted.next() {
                    let _ = tx.send(PipelineEvent::EntityAccepted {
                        entity: entity.clone(),
                        text: entity.text(text).unwrap_or_default().to_string(),
                    });
                }
            } else if let Some(d) = discarded.next() {
                let _ = tx.send(PipelineEvent::EntityDiscarded {
                    entity: d.entity.clone(),
                    blocked_by: d.blocked_by.clone(),
                });
            }
        }

        // === Passo 5: Segmentação ===
        let segments = match segment(text, &reconciliation.accepted) {
            Ok(segments) => segments,
            Err(e) => {
                // Entidades já validadas e reconciliadas: não deveria acontecer
                warn!(error = %e, "segmentação falhou, entregando texto sem destaque");
                let _ = tx.send(PipelineEvent::Error {
                    message: e.to_string(),
                });
                segment(text, &[]).unwrap_or_default()
            }
        };

        debug!(
            segments = segments.len(),
            accepted = reconciliation.accepted.len(),
            discarded = reconciliation.discarded.len(),
            rejected = rejected.len(),
            "análise concluída"
        );

        let _ = tx.send(PipelineEvent::Done {
            analysis: Analysis {
                segments,
                entities: reconciliation.accepted,
                discarded: reconciliation.discarded,
                rejected,
                model_available: model_ok,
                processing_ms: start.elapsed().as_millis() as u64,
            },
        });
    }
}

impl Default for ClinicalPipeline {
    fn default() -> Self {
        Self::new(None)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::segment::concat;
    use proptest::prelude::*;

    struct Noisy(Vec<(usize, usize)>);

    impl TokenClassifier for Noisy {
        fn name(&self) -> &str {
            "noisy"
        }
        fn classify(&self, _text: &str) -> Result<Vec<crate::classifier::ModelPrediction>> {
            Ok(self
                .0
                .iter()
                .map(|&(start, end)| crate::classifier::ModelPrediction {
                    entity_group: "Chemical".into(),
                    score: 0.9,
                    start,
                    end,
                    word: String::new(),
                })
                .collect())
        }
    }

    proptest! {
        // Offsets arbitrários (inclusive inválidos) nunca quebram a cobertura
        #[test]
        fn pipeline_always_covers_text(
            text in "[a-z0-9 .é]{0,40}",
            spans in prop::collection::vec((0usize..50, 0usize..50), 0..8),
        ) {
            let pipeline = ClinicalPipeline::new(Some(Arc::new(Noisy(spans))));
            let analysis = pipeline.analyze(&text);
            prop_assert_eq!(concat(&analysis.segments), text);
            for pair in analysis.entities.windows(2) {
                prop_assert!(pair[0].end <= pair[1].start);
            }
        }
    }
}
