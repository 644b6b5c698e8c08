use std::time::Duration;

use serde::{Deserialize, Serialize};

/// action/node id
pub type ActionId = String;

/// One step in an automation flow.
///
/// A disabled action is passed through at execution time: the engine
/// records a skipped step and follows the node's simple edge without
/// performing the side effect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Action {
    /// action id, unique within the flow
    pub id: ActionId,
    /// owning flow id
    pub flow_id: String,
    /// whether the action executes its effect
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    /// kind tag plus kind-specific configuration
    #[serde(flatten)]
    pub kind: ActionKind,
}

fn enabled_default() -> bool {
    true
}

/// Closed set of action kinds.
///
/// Adding a kind is a compile-time exercise: every dispatch site
/// matches exhaustively on this enum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, strum::AsRefStr)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    /// Explicit dead end; the run stops here.
    Empty,
    /// Conditional branch over the contact's order history.
    BooleanTest {
        #[serde(default)]
        condition: Option<ConditionConfig>,
    },
    /// Durable suspension for a fixed interval.
    Wait {
        #[serde(default)]
        duration: i64,
        #[serde(default)]
        unit: WaitUnit,
    },
    /// Send a single email template to the run's contact.
    SendEmail {
        template_id: String,
    },
    /// Send the next undelivered template from an ordered group.
    SendEmailFromTemplateGroup {
        template_group_id: String,
    },
    /// Add the contact to an external audience list.
    AddToAudienceList {
        audience_list_id: String,
    },
}

/// Condition configured on a boolean-test action.
///
/// The `amount` threshold is kept as raw JSON: the editor may have
/// saved a non-numeric value, which must surface as a configuration
/// error at evaluation time rather than fail the whole flow parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, strum::AsRefStr)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConditionConfig {
    /// True when any completed order contains the product (any role),
    /// or any completed order at all when no product is configured.
    HasOrderedProduct {
        #[serde(default)]
        product_id: Option<String>,
    },
    /// True when any completed order came through the funnel (or any
    /// funnel, when unspecified).
    HasOrderedThroughFunnel {
        #[serde(default)]
        funnel_id: Option<String>,
    },
    /// True when the sum of completed order totals reaches the
    /// threshold in minor units.
    HasOrderedAtLeast {
        #[serde(default)]
        amount: Option<serde_json::Value>,
    },
}

/// Unit of a wait action's duration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WaitUnit {
    Minutes,
    Hours,
    #[default]
    Days,
    Weeks,
}

impl WaitUnit {
    /// Convert a duration count in this unit into wall-clock time.
    pub fn to_duration(
        &self,
        count: i64,
    ) -> Duration {
        let seconds = match self {
            WaitUnit::Minutes => 60,
            WaitUnit::Hours => 60 * 60,
            WaitUnit::Days => 24 * 60 * 60,
            WaitUnit::Weeks => 7 * 24 * 60 * 60,
        };
        Duration::from_secs(count.max(0) as u64 * seconds)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_action_kind_roundtrip() {
        let json = r#"{
            "id": "a1",
            "flow_id": "f1",
            "kind": "boolean_test",
            "condition": { "type": "has_ordered_at_least", "amount": 5000 }
        }"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert!(action.enabled);
        match &action.kind {
            ActionKind::BooleanTest {
                condition: Some(ConditionConfig::HasOrderedAtLeast {
                    amount,
                }),
            } => {
                assert_eq!(amount.as_ref().unwrap().as_i64(), Some(5000));
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_wait_action_defaults() {
        let json = r#"{ "id": "a2", "flow_id": "f1", "kind": "wait" }"#;
        let action: Action = serde_json::from_str(json).unwrap();
        match action.kind {
            ActionKind::Wait {
                duration,
                unit,
            } => {
                assert_eq!(duration, 0);
                assert_eq!(unit, WaitUnit::Days);
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_wait_unit_durations() {
        assert_eq!(WaitUnit::Minutes.to_duration(5).as_secs(), 300);
        assert_eq!(WaitUnit::Days.to_duration(3).as_secs(), 3 * 86400);
        assert_eq!(WaitUnit::Weeks.to_duration(1).as_secs(), 7 * 86400);
        // negative counts collapse to zero rather than panicking
        assert_eq!(WaitUnit::Hours.to_duration(-2).as_secs(), 0);
    }
}
