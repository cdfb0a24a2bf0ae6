use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// Flag data needed for evaluation, as loaded from storage
#[derive(Debug, Clone)]
pub struct FlagDefinition {
    pub key: String,
    pub enabled: bool,
    pub conditions: Vec<Condition>,
    pub parameters: Map<String, Value>,
}

// One attribute/operator/value predicate within a flag's rule set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub attribute: String,
    pub operator: String,
    pub value: Value,
}

// Flag evaluation result
#[derive(Debug, Serialize, PartialEq)]
pub struct EvaluationResult {
    pub flag_key: String,
    pub enabled: bool,
    pub parameters: Map<String, Value>,
}

impl EvaluationResult {
    fn off(flag_key: &str) -> Self {
        EvaluationResult {
            flag_key: flag_key.to_string(),
            enabled: false,
            parameters: Map::new(),
        }
    }
}

/// Evaluate a single flag for a given set of user attributes.
///
/// Pure and deterministic: no I/O, no hidden state, and never an error.
/// The conditions form a logical AND that short-circuits on the first
/// failure. Anything ambiguous (missing attribute, unknown operator,
/// malformed `in` operand) counts as a non-match so a flag can never
/// turn itself on because of a data surprise.
pub fn evaluate(flag: &FlagDefinition, user_attributes: &Map<String, Value>) -> EvaluationResult {
    // Step 1: Kill switch. Checked before any condition work so
    // disablement is O(1) regardless of the rule set.
    if !flag.enabled {
        return EvaluationResult::off(&flag.key);
    }

    // Step 2: All conditions must pass; the empty set trivially passes.
    for condition in &flag.conditions {
        if !condition_matches(condition, user_attributes) {
            return EvaluationResult::off(&flag.key);
        }
    }

    // Step 3: Flag is on, and only now do parameters reach the caller.
    EvaluationResult {
        flag_key: flag.key.clone(),
        enabled: true,
        parameters: flag.parameters.clone(),
    }
}

fn condition_matches(condition: &Condition, user_attributes: &Map<String, Value>) -> bool {
    // Closed world: missing attribute is a non-match, not an error
    let actual = match user_attributes.get(&condition.attribute) {
        Some(value) => value,
        None => return false,
    };

    match condition.operator.as_str() {
        "equals" => actual == &condition.value,
        "in" => match &condition.value {
            // Reference must be a non-empty array; anything else fails closed
            Value::Array(items) if !items.is_empty() => items.contains(actual),
            _ => false,
        },
        // Unknown operator: fail closed so new operators can ship
        // without breaking older evaluators
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn condition(attribute: &str, operator: &str, value: Value) -> Condition {
        Condition {
            attribute: attribute.to_string(),
            operator: operator.to_string(),
            value,
        }
    }

    #[test]
    fn test_kill_switch_dominates() {
        let flag = FlagDefinition {
            key: "checkout_v2".to_string(),
            enabled: false,
            conditions: vec![],
            parameters: object(json!({"theme": "dark"})),
        };

        let result = evaluate(&flag, &object(json!({"country": "CA"})));
        assert!(!result.enabled);
        // Parameters never leak when the flag is off
        assert!(result.parameters.is_empty());
        assert_eq!(result.flag_key, "checkout_v2");
    }

    #[test]
    fn test_empty_conditions_pass_trivially() {
        let flag = FlagDefinition {
            key: "banner".to_string(),
            enabled: true,
            conditions: vec![],
            parameters: object(json!({"color": "blue"})),
        };

        let result = evaluate(&flag, &Map::new());
        assert!(result.enabled);
        assert_eq!(result.parameters, object(json!({"color": "blue"})));
    }

    #[test]
    fn test_equals_matches_by_value() {
        let flag = FlagDefinition {
            key: "beta".to_string(),
            enabled: true,
            conditions: vec![condition("plan", "equals", json!("pro"))],
            parameters: Map::new(),
        };

        assert!(evaluate(&flag, &object(json!({"plan": "pro"}))).enabled);
        assert!(!evaluate(&flag, &object(json!({"plan": "free"}))).enabled);
        // Missing attribute fails closed
        assert!(!evaluate(&flag, &object(json!({"country": "CA"}))).enabled);
    }

    #[test]
    fn test_equals_on_non_string_values() {
        let flag = FlagDefinition {
            key: "limits".to_string(),
            enabled: true,
            conditions: vec![condition("seats", "equals", json!(5))],
            parameters: Map::new(),
        };

        assert!(evaluate(&flag, &object(json!({"seats": 5}))).enabled);
        assert!(!evaluate(&flag, &object(json!({"seats": "5"}))).enabled);
    }

    #[test]
    fn test_in_membership() {
        let flag = FlagDefinition {
            key: "regional".to_string(),
            enabled: true,
            conditions: vec![condition("country", "in", json!(["CA", "US"]))],
            parameters: Map::new(),
        };

        assert!(evaluate(&flag, &object(json!({"country": "CA"}))).enabled);
        assert!(!evaluate(&flag, &object(json!({"country": "FR"}))).enabled);
        assert!(!evaluate(&flag, &object(json!({"city": "Lyon"}))).enabled);
    }

    #[test]
    fn test_in_with_empty_or_non_list_reference_fails_closed() {
        let empty = FlagDefinition {
            key: "regional".to_string(),
            enabled: true,
            conditions: vec![condition("country", "in", json!([]))],
            parameters: Map::new(),
        };
        assert!(!evaluate(&empty, &object(json!({"country": "CA"}))).enabled);

        let scalar = FlagDefinition {
            key: "regional".to_string(),
            enabled: true,
            conditions: vec![condition("country", "in", json!("CA"))],
            parameters: Map::new(),
        };
        assert!(!evaluate(&scalar, &object(json!({"country": "CA"}))).enabled);
    }

    #[test]
    fn test_unknown_operator_fails_closed() {
        let flag = FlagDefinition {
            key: "experimental".to_string(),
            enabled: true,
            conditions: vec![condition("plan", "greater_than", json!("free"))],
            parameters: object(json!({"x": 1})),
        };

        let result = evaluate(&flag, &object(json!({"plan": "pro"})));
        assert!(!result.enabled);
        assert!(result.parameters.is_empty());
    }

    #[test]
    fn test_and_short_circuits_on_first_failure() {
        let flag = FlagDefinition {
            key: "promo".to_string(),
            enabled: true,
            conditions: vec![
                condition("subscription", "equals", json!("premium")),
                condition("country", "in", json!(["CA", "US"])),
            ],
            parameters: object(json!({"discount": 40})),
        };

        // Both conditions hold
        let hit = evaluate(
            &flag,
            &object(json!({"subscription": "premium", "country": "CA"})),
        );
        assert!(hit.enabled);
        assert_eq!(hit.parameters, object(json!({"discount": 40})));

        // Second condition's attribute is missing
        let miss = evaluate(&flag, &object(json!({"subscription": "premium"})));
        assert!(!miss.enabled);
        assert!(miss.parameters.is_empty());
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let flag = FlagDefinition {
            key: "promo".to_string(),
            enabled: true,
            conditions: vec![condition("subscription", "equals", json!("premium"))],
            parameters: object(json!({"discount": 40})),
        };
        let attributes = object(json!({"subscription": "premium"}));

        let first = evaluate(&flag, &attributes);
        let second = evaluate(&flag, &attributes);
        assert_eq!(first, second);
    }
}
