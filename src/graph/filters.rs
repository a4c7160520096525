//! Predicates that drop relations before they reach the graph

use crate::config::Parameters;
use crate::graph::{Relation, RelationKind};

/// Decides whether a relation is allowed to affect the graph
pub trait RelationFilter: Send + Sync {
    fn check(&self, relation: &Relation) -> bool;
}

impl<F> RelationFilter for F
where
    F: Fn(&Relation) -> bool + Send + Sync,
{
    fn check(&self, relation: &Relation) -> bool {
        self(relation)
    }
}

/// Keeps transfers that are large enough between accounts that hold enough
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferFilter {
    min_amount: f64,
    min_balance: f64,
}

impl TransferFilter {
    pub fn new(params: &Parameters) -> Self {
        let scale = params.token_usd_rate * params.token_precision as f64;
        Self {
            min_amount: scale * params.transaction_amount_threshold as f64,
            min_balance: scale * params.account_amount_threshold as f64,
        }
    }
}

impl RelationFilter for TransferFilter {
    fn check(&self, relation: &Relation) -> bool {
        match relation.kind {
            RelationKind::Transfer {
                amount,
                source_balance,
                target_balance,
            } => {
                amount as f64 >= self.min_amount
                    && source_balance as f64 >= self.min_balance
                    && target_balance as f64 >= self.min_balance
            }
            _ => false,
        }
    }
}
