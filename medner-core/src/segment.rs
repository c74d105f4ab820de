//! # Segmentação do Texto para Destaque
//!
//! Transforma a lista reconciliada de entidades em uma sequência de segmentos
//! que cobre o texto **inteiro, sem lacunas e sem repetição**:
//!
//! ```text
//! "Take 500mg Aspirin daily"
//!  [Take ][500mg][ ][Aspirin][ ][daily]
//!    -    DOSAGE  -  CHEMICAL  -  DOSAGE
//! ```
//!
//! Concatenar o `text` de todos os segmentos, em ordem, reproduz a entrada
//! byte a byte. Esse é o invariante que a UI depende para renderizar.

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityLabel};
use crate::error::{NerError, Result};

/// Um pedaço contíguo do texto original, com ou sem rótulo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Texto do segmento (nunca vazio)
    pub text: String,
    /// Rótulo da entidade, ou `None` para texto comum
    pub label: Option<EntityLabel>,
    /// Posição de byte inicial no texto original
    pub start: usize,
    /// Posição de byte final no texto original (exclusiva)
    pub end: usize,
}

impl Segment {
    fn plain(source: &str, start: usize, end: usize) -> Self {
        Self {
            text: source[start..end].to_string(),
            label: None,
            start,
            end,
        }
    }

    fn labeled(source: &str, entity: &Entity) -> Self {
        Self {
            text: source[entity.start..entity.end].to_string(),
            label: Some(entity.label.clone()),
            start: entity.start,
            end: entity.end,
        }
    }

    /// Par `(texto, rótulo)` no formato consumido por componentes de destaque.
    pub fn as_pair(&self) -> (&str, Option<&str>) {
        (self.text.as_str(), self.label.as_ref().map(|l| l.name()))
    }

    pub fn is_entity(&self) -> bool {
        self.label.is_some()
    }
}

/// Segmenta `source` usando entidades já reconciliadas.
///
/// Cada entidade é validada antes do fatiamento: offsets fora do texto,
/// invertidos ou fora de fronteira UTF-8 geram [`NerError::MalformedEntity`];
/// uma entidade que começa antes do cursor gera [`NerError::Overlap`].
/// Texto vazio produz uma lista vazia.
pub fn segment(source: &str, entities: &[Entity]) -> Result<Vec<Segment>> {
    let mut segments = Vec::with_capacity(entities.len() * 2 + 1);
    let mut cursor = 0usize;

    for entity in entities {
        entity.validate(source)?;
        if entity.start < cursor {
            return Err(NerError::Overlap {
                start: entity.start,
                cursor,
            });
        }

        if entity.start > cursor {
            segments.push(Segment::plain(source, cursor, entity.start));
        }
        segments.push(Segment::labeled(source, entity));
        cursor = entity.end;
    }

    if cursor < source.len() {
        segments.push(Segment::plain(source, cursor, source.len()));
    }

    Ok(segments)
}

/// Junta segmentos consecutivos com o mesmo rótulo (inclusive texto comum).
///
/// Opção do renderizador: o pipeline nunca chama esta função, pois duas
/// entidades vizinhas de mesmo rótulo continuam sendo entidades distintas.
pub fn combine_adjacent(segments: Vec<Segment>) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::with_capacity(segments.len());
    for seg in segments {
        match out.last_mut() {
            Some(prev) if prev.label == seg.label && prev.end == seg.start => {
                prev.text.push_str(&seg.text);
                prev.end = seg.end;
            }
            _ => out.push(seg),
        }
    }
    out
}

/// Reconstrói o texto a partir dos segmentos.
pub fn concat(segments: &[Segment]) -> String {
    segments.iter().map(|s| s.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(segments: &[Segment]) -> Vec<(&str, Option<&str>)> {
        segments.iter().map(Segment::as_pair).collect()
    }

    #[test]
    fn test_segment_take_aspirin_daily() {
        let text = "Take 500mg Aspirin daily";
        let entities = vec![
            Entity::from_pattern("DOSAGE", 5, 10),
            Entity::from_model("CHEMICAL", 0.99, 11, 18),
            Entity::from_pattern("DOSAGE", 19, 24),
        ];
        let segments = segment(text, &entities).unwrap();
        assert_eq!(
            pairs(&segments),
            vec![
                ("Take ", None),
                ("500mg", Some("DOSAGE")),
                (" ", None),
                ("Aspirin", Some("CHEMICAL")),
                (" ", None),
                ("daily", Some("DOSAGE")),
            ]
        );
        assert_eq!(concat(&segments), text);
    }

    #[test]
    fn test_empty_text_yields_no_segments() {
        assert!(segment("", &[]).unwrap().is_empty());
    }

    #[test]
    fn test_no_entities_yields_single_plain_segment() {
        let segments = segment("sem achados", &[]).unwrap();
        assert_eq!(pairs(&segments), vec![("sem achados", None)]);
    }

    #[test]
    fn test_entity_covering_whole_text() {
        let segments = segment("Aspirin", &[Entity::from_model("CHEMICAL", 0.9, 0, 7)]).unwrap();
        assert_eq!(pairs(&segments), vec![("Aspirin", Some("CHEMICAL"))]);
    }

    #[test]
    fn test_back_to_back_same_label_stay_separate() {
        let text = "10mg5mg";
        let entities = vec![
            Entity::from_pattern("DOSAGE", 0, 4),
            Entity::from_pattern("DOSAGE", 4, 7),
        ];
        let segments = segment(text, &entities).unwrap();
        assert_eq!(segments.len(), 2);

        let combined = combine_adjacent(segments);
        assert_eq!(pairs(&combined), vec![("10mg5mg", Some("DOSAGE"))]);
    }

    #[test]
    fn test_offsets_track_source() {
        let text = "dose: 5 ml";
        let segments = segment(text, &[Entity::from_pattern("DOSAGE", 6, 10)]).unwrap();
        assert_eq!((segments[0].start, segments[0].end), (0, 6));
        assert_eq!((segments[1].start, segments[1].end), (6, 10));
    }

    #[test]
    fn test_out_of_range_entity_is_an_error() {
        let err = segment("abc", &[Entity::from_model("CHEMICAL", 0.9, 1, 10)]).unwrap_err();
        assert!(matches!(err, NerError::MalformedEntity { .. }));
    }

    #[test]
    fn test_unreconciled_input_is_an_error() {
        let entities = vec![
            Entity::from_model("CHEMICAL", 0.9, 0, 5),
            Entity::from_pattern("DOSAGE", 3, 6),
        ];
        let err = segment("abcdefg", &entities).unwrap_err();
        assert!(matches!(err, NerError::Overlap { start: 3, cursor: 5 }));
    }

    #[test]
    fn test_multibyte_text() {
        let text = "Dipirona 500mg após refeição";
        let start = text.find("500mg").unwrap();
        let segments = segment(text, &[Entity::from_pattern("DOSAGE", start, start + 5)]).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(concat(&segments), text);
    }
}
