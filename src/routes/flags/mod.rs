pub mod routes;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::evaluation::Condition;
use crate::store::flags::{FlagConfig, FlagRecord};

// MODELS

#[derive(Debug, Deserialize)]
pub struct UpsertFlagRequest {
    pub key: String,
    pub enabled: bool,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct FlagResponse {
    pub id: Uuid,
    pub key: String,
    pub enabled: bool,
    pub conditions: Vec<Condition>,
    pub parameters: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FlagRecord> for FlagResponse {
    fn from(record: FlagRecord) -> Self {
        FlagResponse {
            id: record.id,
            key: record.key,
            enabled: record.enabled,
            conditions: record.conditions.0,
            parameters: record.parameters.0,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl UpsertFlagRequest {
    pub fn into_config(self) -> FlagConfig {
        FlagConfig {
            key: self.key,
            enabled: self.enabled,
            conditions: self.conditions,
            parameters: self.parameters,
        }
    }
}

// Paging defaults for flag listings
pub const DEFAULT_LIST_LIMIT: i64 = 50;

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl ListParams {
    // Unparsable values fall back to the defaults instead of erroring
    pub fn limit(&self) -> i64 {
        self.limit
            .as_deref()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LIST_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset
            .as_deref()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
}

// VALIDATION

/// Flag key format shared by storage and evaluation callers.
pub fn validate_flag_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("Flag key cannot be empty".to_string());
    }

    if key.len() > 64 {
        return Err("Flag key is too long (max 64 characters)".to_string());
    }

    let mut chars = key.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_lowercase()) {
        return Err("Flag key must start with a lowercase letter".to_string());
    }

    if !key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(
            "Flag key may only contain lowercase letters, digits, underscores and hyphens"
                .to_string(),
        );
    }

    Ok(())
}

/// Boundary validation of an upsert payload. The engine still fails
/// closed on semantically odd values, but malformed configurations are
/// rejected here before they reach storage.
pub fn validate_flag_config(payload: &UpsertFlagRequest) -> Result<(), String> {
    validate_flag_key(&payload.key)?;

    for condition in &payload.conditions {
        if condition.attribute.is_empty() {
            return Err("Condition attribute cannot be empty".to_string());
        }

        match condition.operator.as_str() {
            "equals" => {}
            "in" => match &condition.value {
                Value::Array(items) if !items.is_empty() => {}
                _ => {
                    return Err(format!(
                        "Operator 'in' on '{}' requires a non-empty array value",
                        condition.attribute
                    ))
                }
            },
            other => {
                return Err(format!(
                    "Unknown operator '{}' (expected 'equals' or 'in')",
                    other
                ))
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(key: &str, conditions: Vec<Condition>) -> UpsertFlagRequest {
        UpsertFlagRequest {
            key: key.to_string(),
            enabled: true,
            conditions,
            parameters: Map::new(),
        }
    }

    fn condition(attribute: &str, operator: &str, value: Value) -> Condition {
        Condition {
            attribute: attribute.to_string(),
            operator: operator.to_string(),
            value,
        }
    }

    #[test]
    fn test_flag_key_rules() {
        assert!(validate_flag_key("promo").is_ok());
        assert!(validate_flag_key("promo_2024-ca").is_ok());

        assert!(validate_flag_key("").is_err());
        assert!(validate_flag_key("Promo").is_err());
        assert!(validate_flag_key("2promo").is_err());
        assert!(validate_flag_key("promo flag").is_err());
        assert!(validate_flag_key(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_config_accepts_known_operators() {
        let payload = request(
            "promo",
            vec![
                condition("subscription", "equals", json!("premium")),
                condition("country", "in", json!(["CA", "US"])),
            ],
        );
        assert!(validate_flag_config(&payload).is_ok());
    }

    #[test]
    fn test_config_rejects_unknown_operator() {
        let payload = request("promo", vec![condition("plan", "matches", json!("p.*"))]);
        assert!(validate_flag_config(&payload).is_err());
    }

    #[test]
    fn test_config_rejects_malformed_in_operand() {
        let empty = request("promo", vec![condition("country", "in", json!([]))]);
        assert!(validate_flag_config(&empty).is_err());

        let scalar = request("promo", vec![condition("country", "in", json!("CA"))]);
        assert!(validate_flag_config(&scalar).is_err());
    }

    #[test]
    fn test_missing_conditions_and_parameters_default_to_empty() {
        let payload: UpsertFlagRequest =
            serde_json::from_value(json!({"key": "promo", "enabled": true})).unwrap();
        assert!(payload.conditions.is_empty());
        assert!(payload.parameters.is_empty());
    }

    #[test]
    fn test_list_params_fall_back_on_garbage() {
        let params = ListParams {
            limit: Some("abc".to_string()),
            offset: Some("-".to_string()),
        };
        assert_eq!(params.limit(), DEFAULT_LIST_LIMIT);
        assert_eq!(params.offset(), 0);

        let params = ListParams {
            limit: Some("10".to_string()),
            offset: Some("5".to_string()),
        };
        assert_eq!(params.limit(), 10);
        assert_eq!(params.offset(), 5);
    }
}
