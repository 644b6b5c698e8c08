//! Condition evaluation for boolean-test nodes.
//!
//! Evaluation is a pure function over a condition configuration and
//! the contact's order history. Only completed orders count; pending
//! and refunded orders are invisible to every condition type.

use tracing::debug;

use crate::{
    DripflowError, Result,
    model::ConditionConfig,
    store::data::{Order, OrderStatus},
};

/// Evaluate a condition against the contact's order history.
///
/// Returns a configuration error when the condition carries a
/// malformed threshold; the caller decides how that failure affects
/// the run.
pub fn evaluate(
    condition: &ConditionConfig,
    orders: &[Order],
) -> Result<bool> {
    let completed = orders.iter().filter(|o| o.status == OrderStatus::Completed);

    let result = match condition {
        ConditionConfig::HasOrderedProduct {
            product_id,
        } => match product_id {
            Some(product_id) => completed.into_iter().any(|o| o.items.iter().any(|item| item.product_id == *product_id)),
            None => completed.into_iter().next().is_some(),
        },
        ConditionConfig::HasOrderedThroughFunnel {
            funnel_id,
        } => match funnel_id {
            Some(funnel_id) => completed.into_iter().any(|o| o.funnel_id.as_deref() == Some(funnel_id.as_str())),
            None => completed.into_iter().any(|o| o.funnel_id.is_some()),
        },
        ConditionConfig::HasOrderedAtLeast {
            amount,
        } => {
            let threshold = amount
                .as_ref()
                .and_then(|v| v.as_i64())
                .ok_or_else(|| DripflowError::Configuration(format!("invalid amount threshold: {:?}", amount)))?;
            let total: i64 = completed.into_iter().map(|o| o.total_amount).sum();
            total >= threshold
        }
    };
    debug!("condition {} evaluated to {}", condition.as_ref(), result);

    Ok(result)
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::store::data::{OrderItem, ProductRole};

    fn order(
        id: &str,
        status: OrderStatus,
        total: i64,
        funnel: Option<&str>,
        products: &[(&str, ProductRole)],
    ) -> Order {
        Order {
            id: id.to_string(),
            contact_id: "c1".to_string(),
            status,
            total_amount: total,
            funnel_id: funnel.map(|f| f.to_string()),
            items: products
                .iter()
                .map(|(product_id, role)| OrderItem {
                    product_id: product_id.to_string(),
                    role: *role,
                })
                .collect(),
            completed_at: 0,
        }
    }

    #[test]
    fn test_has_ordered_product() {
        let orders = [
            order("o1", OrderStatus::Completed, 1000, None, &[("p1", ProductRole::Primary), ("p2", ProductRole::Bump)]),
            order("o2", OrderStatus::Refunded, 9000, None, &[("p3", ProductRole::Primary)]),
        ];

        let hit = ConditionConfig::HasOrderedProduct {
            product_id: Some("p2".to_string()),
        };
        assert!(evaluate(&hit, &orders).unwrap());

        // p3 only appears on a refunded order
        let miss = ConditionConfig::HasOrderedProduct {
            product_id: Some("p3".to_string()),
        };
        assert!(!evaluate(&miss, &orders).unwrap());

        let any = ConditionConfig::HasOrderedProduct {
            product_id: None,
        };
        assert!(evaluate(&any, &orders).unwrap());
    }

    #[test]
    fn test_has_ordered_through_funnel() {
        let orders = [
            order("o1", OrderStatus::Completed, 1000, Some("fn1"), &[("p1", ProductRole::Primary)]),
            order("o2", OrderStatus::Completed, 1000, None, &[("p1", ProductRole::Primary)]),
        ];

        let hit = ConditionConfig::HasOrderedThroughFunnel {
            funnel_id: Some("fn1".to_string()),
        };
        assert!(evaluate(&hit, &orders).unwrap());

        let miss = ConditionConfig::HasOrderedThroughFunnel {
            funnel_id: Some("fn2".to_string()),
        };
        assert!(!evaluate(&miss, &orders).unwrap());

        let any = ConditionConfig::HasOrderedThroughFunnel {
            funnel_id: None,
        };
        assert!(evaluate(&any, &orders).unwrap());
    }

    #[test]
    fn test_has_ordered_at_least_sums_completed_orders() {
        let orders = [
            order("o1", OrderStatus::Completed, 2000, None, &[]),
            order("o2", OrderStatus::Completed, 3500, None, &[]),
            order("o3", OrderStatus::Refunded, 100_000, None, &[]),
        ];

        let cond = ConditionConfig::HasOrderedAtLeast {
            amount: Some(json!(5000)),
        };
        assert!(evaluate(&cond, &orders).unwrap());

        let cond = ConditionConfig::HasOrderedAtLeast {
            amount: Some(json!(6000)),
        };
        assert!(!evaluate(&cond, &orders).unwrap());
    }

    #[test]
    fn test_invalid_threshold_is_a_configuration_error() {
        let orders = [order("o1", OrderStatus::Completed, 2000, None, &[])];

        for amount in [Some(json!("a lot")), None] {
            let cond = ConditionConfig::HasOrderedAtLeast {
                amount,
            };
            let err = evaluate(&cond, &orders).unwrap_err();
            assert!(matches!(err, DripflowError::Configuration(_)));
        }
    }
}
