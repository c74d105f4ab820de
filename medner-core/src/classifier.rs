//! # Classificador de Tokens (Modelo)
//!
//! O modelo estatístico é um colaborador externo: recebe o texto e devolve
//! grupos de entidades `{entity_group, score, start, end, word}`. Este módulo
//! define esse contrato ([`TokenClassifier`]), a agregação de predições
//! token a token em grupos ([`aggregate_simple`]) e um classificador por
//! dicionário ([`GazetteerClassifier`]) para rodar sem rede neural.
//!
//! ## Agregação "simple"
//!
//! Modelos de classificação de tokens emitem uma tag BIO por token. A
//! estratégia "simple" reconstrói as entidades:
//! - `B-X` sempre abre um novo grupo `X`;
//! - `I-X` (ou `X` sem prefixo) continua o grupo aberto se for do mesmo tipo,
//!   senão abre um novo;
//! - `O` fecha o grupo aberto.
//!
//! O score do grupo é a média dos scores dos tokens; o intervalo vai do início
//! do primeiro token ao fim do último (espaços internos incluídos).
//!
//! ```text
//! type   2      diabetes      →  DISEASE [type 2 diabetes] score = média
//! B-Dis  I-Dis  I-Dis
//! ```

use serde::{Deserialize, Serialize};

use crate::entity::EntityLabel;
use crate::error::{NerError, Result};
use crate::tokenizer::{tokenize, Token};

/// Predição de um grupo de entidade, no formato de saída do modelo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPrediction {
    /// Grupo da entidade (ex: "Chemical", "Disease")
    pub entity_group: String,
    /// Confiança do modelo
    pub score: f64,
    /// Byte inicial (inclusivo)
    ///
    /// Modelos no estilo HF devolvem offsets em *caracteres*; quem integrar um
    /// modelo externo deve convertê-los para bytes antes de devolver a
    /// predição, senão notas com acentos são rejeitadas ou fatiadas errado.
    pub start: usize,
    /// Byte final (exclusivo)
    pub end: usize,
    /// Texto reportado pelo modelo (informativo; o pipeline deriva dos offsets)
    pub word: String,
}

/// Predição de um único token com tag BIO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPrediction {
    /// Tag BIO (ex: "B-Chemical", "I-Disease", "O")
    pub tag: String,
    pub score: f64,
    pub start: usize,
    pub end: usize,
}

/// Contrato do modelo de classificação de tokens.
///
/// Implementações precisam ser `Send + Sync`: o pipeline é compartilhado
/// entre requisições e lotes paralelos.
pub trait TokenClassifier: Send + Sync {
    /// Nome do modelo (para logs)
    fn name(&self) -> &str;

    /// Classifica o texto. Falhas viram `SourceUnavailable` no pipeline.
    fn classify(&self, text: &str) -> Result<Vec<ModelPrediction>>;
}

/// Separa a tag BIO em (prefixo, tipo). Tag sem prefixo conta como `I`.
fn split_tag(tag: &str) -> Option<(char, &str)> {
    if tag == "O" {
        return None;
    }
    match tag.split_once('-') {
        Some(("B", ty)) => Some(('B', ty)),
        Some(("I", ty)) => Some(('I', ty)),
        _ => Some(('I', tag)),
    }
}

struct OpenGroup<'a> {
    entity_group: &'a str,
    start: usize,
    end: usize,
    score_sum: f64,
    count: usize,
}

impl OpenGroup<'_> {
    fn close(self, text: &str) -> ModelPrediction {
        ModelPrediction {
            entity_group: self.entity_group.to_string(),
            score: self.score_sum / self.count as f64,
            start: self.start,
            end: self.end,
            word: text.get(self.start..self.end).unwrap_or_default().to_string(),
        }
    }
}

/// Agrega predições BIO token a token em grupos de entidade.
pub fn aggregate_simple(tokens: &[TokenPrediction], text: &str) -> Vec<ModelPrediction> {
    let mut groups = Vec::new();
    let mut open: Option<OpenGroup> = None;

    for token in tokens {
        let Some((prefix, ty)) = split_tag(&token.tag) else {
            if let Some(g) = open.take() {
                groups.push(g.close(text));
            }
            continue;
        };

        let continues = prefix == 'I' && open.as_ref().is_some_and(|g| g.entity_group == ty);
        if continues {
            if let Some(g) = open.as_mut() {
                g.end = token.end;
                g.score_sum += token.score;
                g.count += 1;
            }
            continue;
        }

        if let Some(g) = open.take() {
            groups.push(g.close(text));
        }
        open = Some(OpenGroup {
            entity_group: ty,
            start: token.start,
            end: token.end,
            score_sum: token.score,
            count: 1,
        });
    }

    if let Some(g) = open {
        groups.push(g.close(text));
    }
    groups
}

/// Listas de termos conhecidos por rótulo, em minúsculas e já tokenizadas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Gazetteer {
    #[serde(default)]
    pub chemicals: Vec<String>,
    #[serde(default)]
    pub diseases: Vec<String>,
}

impl Gazetteer {
    /// Gazetteer semente com medicamentos e doenças comuns.
    pub fn seed() -> Self {
        Self {
            chemicals: crate::corpus::CHEMICALS.iter().map(|s| s.to_string()).collect(),
            diseases: crate::corpus::DISEASES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Lê um gazetteer em JSON: `{"chemicals": [...], "diseases": [...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Acrescenta os termos de outro gazetteer.
    pub fn extend(&mut self, other: Gazetteer) {
        self.chemicals.extend(other.chemicals);
        self.diseases.extend(other.diseases);
    }
}

/// Classificador por dicionário: reconhece termos de um [`Gazetteer`]
/// (inclusive multi-palavra) e emite tags BIO que passam por
/// [`aggregate_simple`], como faria um modelo de verdade.
pub struct GazetteerClassifier {
    /// (tokens do termo em minúsculas, rótulo, confiança)
    entries: Vec<(Vec<String>, EntityLabel, f64)>,
}

impl GazetteerClassifier {
    pub fn new(gazetteer: &Gazetteer) -> Self {
        let mut entries = Vec::new();
        let lists = [
            (&gazetteer.chemicals, EntityLabel::Chemical, 0.93),
            (&gazetteer.diseases, EntityLabel::Disease, 0.90),
        ];
        for (names, label, confidence) in lists {
            for name in names {
                let parts: Vec<String> = tokenize(name).iter().map(Token::lower).collect();
                if !parts.is_empty() {
                    entries.push((parts, label.clone(), confidence));
                }
            }
        }
        // Termos mais longos primeiro: "type 2 diabetes" antes de "diabetes"
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { entries }
    }

    /// Número de termos carregados
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tags BIO token a token para o texto.
    pub fn predict_tokens(&self, text: &str) -> Vec<TokenPrediction> {
        let tokens = tokenize(text);
        let lowered: Vec<String> = tokens.iter().map(Token::lower).collect();
        let mut predictions = Vec::with_capacity(tokens.len());

        let mut i = 0;
        while i < tokens.len() {
            let hit = self.entries.iter().find(|(parts, _, _)| {
                i + parts.len() <= lowered.len()
                    && parts.iter().zip(&lowered[i..]).all(|(p, w)| p == w)
            });

            match hit {
                Some((parts, label, confidence)) => {
                    for (j, token) in tokens[i..i + parts.len()].iter().enumerate() {
                        let prefix = if j == 0 { "B" } else { "I" };
                        predictions.push(TokenPrediction {
                            tag: format!("{prefix}-{}", label.name()),
                            score: *confidence,
                            start: token.start,
                            end: token.end,
                        });
                    }
                    i += parts.len();
                }
                None => {
                    predictions.push(TokenPrediction {
                        tag: "O".to_string(),
                        score: 1.0,
                        start: tokens[i].start,
                        end: tokens[i].end,
                    });
                    i += 1;
                }
            }
        }

        predictions
    }
}

impl TokenClassifier for GazetteerClassifier {
    fn name(&self) -> &str {
        "gazetteer"
    }

    fn classify(&self, text: &str) -> Result<Vec<ModelPrediction>> {
        if self.is_empty() {
            return Err(NerError::SourceUnavailable {
                source_name: self.name().to_string(),
                reason: "gazetteer vazio".to_string(),
            });
        }
        Ok(aggregate_simple(&self.predict_tokens(text), text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tp(tag: &str, score: f64, start: usize, end: usize) -> TokenPrediction {
        TokenPrediction { tag: tag.to_string(), score, start, end }
    }

    #[test]
    fn test_aggregate_groups_bio_runs() {
        let text = "type 2 diabetes and Aspirin";
        let tokens = vec![
            tp("B-Disease", 0.9, 0, 4),
            tp("I-Disease", 0.8, 5, 6),
            tp("I-Disease", 0.7, 7, 15),
            tp("O", 1.0, 16, 19),
            tp("B-Chemical", 0.99, 20, 27),
        ];
        let groups = aggregate_simple(&tokens, text);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].entity_group, "Disease");
        assert_eq!(groups[0].word, "type 2 diabetes");
        assert!((groups[0].score - 0.8).abs() < 1e-9);
        assert_eq!((groups[1].start, groups[1].end), (20, 27));
    }

    #[test]
    fn test_aggregate_b_splits_same_type() {
        let tokens = vec![tp("B-Chemical", 0.9, 0, 3), tp("B-Chemical", 0.9, 4, 7)];
        assert_eq!(aggregate_simple(&tokens, "abc def").len(), 2);
    }

    #[test]
    fn test_aggregate_type_change_opens_group() {
        let tokens = vec![tp("B-Chemical", 0.9, 0, 3), tp("I-Disease", 0.6, 4, 7)];
        let groups = aggregate_simple(&tokens, "abc def");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].entity_group, "Disease");
    }

    #[test]
    fn test_aggregate_unprefixed_tags_continue() {
        let tokens = vec![tp("Disease", 0.5, 0, 5), tp("Disease", 1.0, 6, 10)];
        let groups = aggregate_simple(&tokens, "heart fail");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].word, "heart fail");
    }

    #[test]
    fn test_gazetteer_classifier_prefers_longest_term() {
        let classifier = GazetteerClassifier::new(&Gazetteer {
            chemicals: vec!["aspirin".into()],
            diseases: vec!["diabetes".into(), "type 2 diabetes".into()],
        });
        let text = "Aspirin for Type 2 Diabetes.";
        let preds = classifier.classify(text).unwrap();
        let words: Vec<(&str, &str)> = preds
            .iter()
            .map(|p| (p.entity_group.as_str(), p.word.as_str()))
            .collect();
        assert_eq!(words, vec![("CHEMICAL", "Aspirin"), ("DISEASE", "Type 2 Diabetes")]);
    }

    #[test]
    fn test_seed_gazetteer_finds_example_entities() {
        let classifier = GazetteerClassifier::new(&Gazetteer::seed());
        let text = "The patient was prescribed Aspirin 500mg and Metformin 850 mg for type 2 diabetes.";
        let groups: Vec<String> = classifier
            .classify(text)
            .unwrap()
            .into_iter()
            .map(|p| p.word)
            .collect();
        assert!(groups.contains(&"Aspirin".to_string()));
        assert!(groups.contains(&"Metformin".to_string()));
        assert!(groups.contains(&"type 2 diabetes".to_string()));
    }

    #[test]
    fn test_empty_gazetteer_is_unavailable() {
        let classifier = GazetteerClassifier::new(&Gazetteer::default());
        assert!(matches!(
            classifier.classify("Aspirin"),
            Err(NerError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_offsets_are_bytes_on_accented_text() {
        let classifier = GazetteerClassifier::new(&Gazetteer {
            chemicals: vec!["dipirona".into()],
            diseases: vec!["febre".into()],
        });
        let text = "Após a cirurgia: Dipirona para febre";
        let preds = classifier.classify(text).unwrap();
        assert_eq!(preds.len(), 2);
        for p in &preds {
            assert_eq!(&text[p.start..p.end], p.word);
        }
        // "Após" ocupa 5 bytes e 4 caracteres
        assert_eq!(preds[0].start, text.find("Dipirona").unwrap());
        assert_ne!(preds[0].start, text.chars().position(|c| c == 'D').unwrap());
    }

    #[test]
    fn test_term_count() {
        let classifier = GazetteerClassifier::new(&Gazetteer {
            chemicals: vec!["aspirin".into(), "  ".into()],
            diseases: vec!["type 2 diabetes".into()],
        });
        // Termos sem nenhum token são ignorados
        assert_eq!(classifier.len(), 2);
        assert!(!classifier.is_empty());
        assert!(GazetteerClassifier::new(&Gazetteer::default()).is_empty());
    }

    #[test]
    fn test_gazetteer_from_json() {
        let gaz = Gazetteer::from_json(r#"{"chemicals": ["Dipirona"]}"#).unwrap();
        assert_eq!(gaz.chemicals, vec!["Dipirona"]);
        assert!(gaz.diseases.is_empty());
        assert!(matches!(Gazetteer::from_json("{"), Err(NerError::Gazetteer(_))));
    }
}
