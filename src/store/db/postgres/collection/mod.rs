mod contact;
mod delivery;
mod flow;
mod order;
mod run;
mod run_step;
mod template;
mod trigger;
mod workspace;

use sea_query::{Alias as SeaAlias, Cond, Expr as SeaExpr};
use serde_json::Value as JsonValue;

use crate::store::query::Query;

pub(super) type DbConnection = super::synclient::SynClient;

pub use contact::ContactCollection;
pub use delivery::DeliveryCollection;
pub use flow::FlowCollection;
pub use order::OrderCollection;
pub use run::RunCollection;
pub use run_step::RunStepCollection;
pub use template::TemplateCollection;
pub use trigger::TriggerCollection;
pub use workspace::WorkspaceCollection;

/// Translate a store [`Query`] into a sea-query condition tree.
pub(super) fn into_query(q: &Query) -> Cond {
    let mut cond = Cond::all();
    for (column, value) in q.filters() {
        let col = SeaExpr::col(SeaAlias::new(column));
        cond = match value {
            JsonValue::String(s) => cond.add(col.eq(s.as_str())),
            JsonValue::Bool(b) => cond.add(col.eq(*b)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => cond.add(col.eq(i)),
                None => cond.add(col.eq(n.as_f64().unwrap_or_default())),
            },
            JsonValue::Null => cond.add(col.is_null()),
            _ => cond,
        };
    }
    cond
}
