//! # medner-core — Destaque Híbrido de Entidades Clínicas
//!
//! Este crate extrai entidades de notas clínicas livres e transforma o texto em
//! uma sequência de segmentos rotulados/não rotulados pronta para exibição.
//! Duas fontes independentes alimentam o sistema:
//!
//! - um **classificador de tokens** (modelo) que encontra medicamentos e doenças;
//! - um **motor de padrões** que encontra dosagens (número + unidade).
//!
//! As duas produzem intervalos que podem se sobrepor; a UI precisa de uma única
//! partição do texto, sem lacunas e sem sobreposição.
//!
//! ## Arquitetura do Sistema
//!
//! 1.  **Entrada**: Texto bruto (String).
//! 2.  **Fontes** ([`source`], [`classifier`], [`dosage`]): modelo (opcional) e padrões.
//! 3.  **Reconciliação** ([`reconcile`]): ordena e descarta colisões; o modelo tem prioridade.
//! 4.  **Segmentação** ([`segment`]): cobre o texto inteiro, byte a byte.
//! 5.  **Saída**: Lista de [`Segment`] (ex: "500mg" -> DOSAGE, " " -> sem rótulo).
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use medner_core::ClinicalPipeline;
//!
//! // Sem modelo: modo degradado, apenas dosagens
//! let pipeline = ClinicalPipeline::new(None);
//! let analysis = pipeline.analyze("Take 500mg Aspirin daily");
//!
//! for seg in &analysis.segments {
//!     println!("{:?} -> {:?}", seg.text, seg.label);
//! }
//! assert_eq!(analysis.segments[1].text, "500mg");
//! ```
//!
//! ## Módulos Principais
//!
//! - [`pipeline`]: Orquestrador que conecta fontes, reconciliação e segmentação.
//! - [`entity`]: Entidades e rótulos (conjunto aberto).
//! - [`corpus`]: Vocabulário semente e notas de demonstração.

pub mod classifier;
pub mod corpus;
pub mod dosage;
pub mod entity;
pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod segment;
pub mod source;
pub mod tokenizer;

pub use classifier::{Gazetteer, GazetteerClassifier, ModelPrediction, TokenClassifier};
pub use dosage::DosagePatternSource;
pub use entity::{Entity, EntityLabel, EntityOrigin};
pub use error::{NerError, Result};
pub use pipeline::{Analysis, ClinicalPipeline, PipelineConfig, PipelineEvent};
pub use segment::Segment;
pub use source::{EntitySource, ModelSource};
