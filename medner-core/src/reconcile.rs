//! # Reconciliação de Entidades
//!
//! Funde as entidades do modelo e do motor de padrões em uma única lista
//! ordenada e **sem sobreposição**.
//!
//! ## Algoritmo
//!
//! 1. Concatena as entidades do modelo seguidas das do padrão. Essa ordem é a
//!    **prioridade**: em empate de `start`, quem chegou antes vence.
//! 2. Ordena por `start` de forma **estável** (preserva a prioridade nos empates).
//! 3. Varre da esquerda para a direita com um cursor (inicialmente 0):
//!    - `start < cursor` → descarta a entidade inteira;
//!    - caso contrário → aceita e avança `cursor = end`.
//!
//! Não há corte parcial: uma entidade que começa antes do cursor é descartada
//! mesmo que parte dela caia em região livre.
//!
//! ## Exemplo
//!
//! ```rust
//! use medner_core::entity::Entity;
//! use medner_core::reconcile::reconcile;
//!
//! // "Metformin 850" (modelo) contém "850 " que poderia casar com um padrão
//! let model = vec![Entity::from_model("CHEMICAL", 0.97, 0, 13)];
//! let pattern = vec![Entity::from_pattern("DOSAGE", 10, 16)];
//!
//! let kept = reconcile(model, pattern);
//! assert_eq!(kept.len(), 1);
//! assert_eq!(kept[0].label.name(), "CHEMICAL");
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::Entity;

/// Uma entidade perdedora e a entidade aceita que a bloqueou.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discarded {
    pub entity: Entity,
    pub blocked_by: Entity,
}

/// Resultado detalhado da reconciliação.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Entidades aceitas, ordenadas por `start` e sem sobreposição
    pub accepted: Vec<Entity>,
    /// Entidades descartadas por colisão
    pub discarded: Vec<Discarded>,
}

/// Reconcilia as duas fontes e devolve apenas as entidades aceitas.
pub fn reconcile(model: Vec<Entity>, pattern: Vec<Entity>) -> Vec<Entity> {
    reconcile_with_report(model, pattern).accepted
}

/// Reconcilia as duas fontes registrando também cada descarte.
pub fn reconcile_with_report(model: Vec<Entity>, pattern: Vec<Entity>) -> Reconciliation {
    let mut all = model;
    all.extend(pattern);
    resolve(all)
}

/// Resolve colisões sobre uma lista já concatenada em ordem de prioridade.
pub fn resolve(mut entities: Vec<Entity>) -> Reconciliation {
    // sort_by_key é estável: empates mantêm a ordem de chegada
    entities.sort_by_key(|e| e.start);

    let mut result = Reconciliation::default();
    let mut cursor = 0usize;

    for entity in entities {
        if entity.start < cursor {
            // Se start < cursor, já existe uma entidade aceita antes dela
            let Some(blocker) = result.accepted.last() else {
                continue;
            };
            debug!(
                label = %entity.label,
                start = entity.start,
                end = entity.end,
                cursor,
                blocked_by = %blocker.label,
                "entidade descartada por sobreposição"
            );
            result.discarded.push(Discarded {
                blocked_by: blocker.clone(),
                entity,
            });
            continue;
        }

        cursor = entity.end;
        result.accepted.push(entity);
    }

    result
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_entities(origin_is_model: bool) -> impl Strategy<Value = Vec<Entity>> {
        prop::collection::vec((0usize..60, 1usize..15), 0..12).prop_map(move |spans| {
            spans
                .into_iter()
                .map(|(s, len)| {
                    if origin_is_model {
                        Entity::from_model("CHEMICAL", 0.8, s, s + len)
                    } else {
                        Entity::from_pattern("DOSAGE", s, s + len)
                    }
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn accepted_are_ordered_and_disjoint(model in arb_entities(true), pattern in arb_entities(false)) {
            let kept = reconcile(model, pattern);
            for pair in kept.windows(2) {
                prop_assert!(pair[0].end <= pair[1].start);
            }
        }

        #[test]
        fn every_input_is_accepted_or_discarded(model in arb_entities(true), pattern in arb_entities(false)) {
            let total = model.len() + pattern.len();
            let report = reconcile_with_report(model, pattern);
            prop_assert_eq!(report.accepted.len() + report.discarded.len(), total);
            for d in &report.discarded {
                prop_assert!(d.entity.start < d.blocked_by.end);
            }
        }

        #[test]
        fn accepted_entities_are_untouched(model in arb_entities(true), pattern in arb_entities(false)) {
            let mut inputs = model.clone();
            inputs.extend(pattern.clone());
            for kept in reconcile(model, pattern) {
                prop_assert!(inputs.contains(&kept));
            }
        }
    }
}
