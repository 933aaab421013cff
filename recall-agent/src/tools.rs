//! Action → tool schema translation and the fixed rating tool.

use serde_json::{Map, Value, json};

use recall_llm::{ActionCompletion, ToolSchema};

use crate::knowledge::Action;

/// Name of the rating tool offered in query and guardrail modes.
pub const RATE_TOOL: &str = "rate";

/// Argument of the rating tool.
pub const RATING_ARG: &str = "rating";

/// Rating reported when the model gave no usable rating.
pub const RATING_UNAVAILABLE: i32 = -1;

const MIN_RATING: i64 = 1;
const MAX_RATING: i64 = 5;

/// Tool schema for one action. Every parameter is required.
#[must_use]
pub fn tool_from_action(action: &Action) -> ToolSchema {
    let mut properties = Map::new();
    for parameter in &action.parameters {
        let mut schema = Map::new();
        schema.insert("type".into(), Value::from(parameter.kind.as_str()));
        if !parameter.description.is_empty() {
            schema.insert("description".into(), Value::from(parameter.description.as_str()));
        }
        if let Some(allowed) = &parameter.allowed {
            schema.insert("enum".into(), json!(allowed));
        }
        properties.insert(parameter.name.clone(), Value::Object(schema));
    }
    let required: Vec<&str> = action.parameters.iter().map(|p| p.name.as_str()).collect();

    ToolSchema {
        name: action.name.clone(),
        description: action.description.clone(),
        parameters: json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }),
    }
}

/// Tool schemas for a character's action set, in order.
#[must_use]
pub fn tools_from_actions(actions: &[Action]) -> Vec<ToolSchema> {
    actions.iter().map(tool_from_action).collect()
}

/// The "rate 1–5" tool.
#[must_use]
pub fn rate_tool() -> ToolSchema {
    ToolSchema {
        name: RATE_TOOL.into(),
        description: "Answer the question with a rating from 1 (not at all) to 5 (extremely)."
            .into(),
        parameters: json!({
            "type": "object",
            "properties": {
                RATING_ARG: {
                    "type": "integer",
                    "description": "1 = not at all, 2 = slightly, 3 = moderately, 4 = very, 5 = extremely",
                    "minimum": MIN_RATING,
                    "maximum": MAX_RATING,
                }
            },
            "required": [RATING_ARG],
        }),
    }
}

/// Map a rating tool call to its integer rating.
///
/// Accepts integers, integral floats and numeric strings in 1..=5.
/// Anything else, including no call at all, is [`RATING_UNAVAILABLE`].
#[must_use]
pub fn rating_to_int(completion: Option<&ActionCompletion>) -> i32 {
    let Some(value) = completion.and_then(|c| c.arg(RATING_ARG)) else {
        return RATING_UNAVAILABLE;
    };
    let rating = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    rating
        .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
        .and_then(|r| i32::try_from(r).ok())
        .unwrap_or(RATING_UNAVAILABLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{ActionParameter, ParameterKind};

    fn rating(value: Value) -> ActionCompletion {
        let mut args = Map::new();
        args.insert(RATING_ARG.into(), value);
        ActionCompletion {
            action: RATE_TOOL.into(),
            args,
        }
    }

    #[test]
    fn action_becomes_tool_schema() {
        let action = Action {
            name: "give_item".into(),
            description: "Hand an item to the player".into(),
            parameters: vec![ActionParameter {
                name: "item".into(),
                description: "What to give".into(),
                kind: ParameterKind::String,
                allowed: Some(vec!["sword".into(), "bread".into()]),
            }],
        };

        let tool = tool_from_action(&action);

        assert_eq!(tool.name, "give_item");
        assert_eq!(tool.parameters["properties"]["item"]["type"], "string");
        assert_eq!(tool.parameters["properties"]["item"]["enum"], json!(["sword", "bread"]));
        assert_eq!(tool.parameters["required"], json!(["item"]));
    }

    #[test]
    fn parameterless_action_has_empty_object_schema() {
        let action = Action {
            name: "wave".into(),
            description: String::new(),
            parameters: Vec::new(),
        };
        let tool = tool_from_action(&action);
        assert_eq!(tool.parameters["properties"], json!({}));
        assert_eq!(tools_from_actions(&[action]).len(), 1);
    }

    #[test]
    fn rating_accepts_numbers_and_numeric_strings() {
        assert_eq!(rating_to_int(Some(&rating(json!(4)))), 4);
        assert_eq!(rating_to_int(Some(&rating(json!(2.0)))), 2);
        assert_eq!(rating_to_int(Some(&rating(json!(" 5 ")))), 5);
    }

    #[test]
    fn unusable_ratings_fall_back() {
        assert_eq!(rating_to_int(None), RATING_UNAVAILABLE);
        assert_eq!(rating_to_int(Some(&ActionCompletion::default())), RATING_UNAVAILABLE);
        assert_eq!(rating_to_int(Some(&rating(json!(2.5)))), RATING_UNAVAILABLE);
        assert_eq!(rating_to_int(Some(&rating(json!(9)))), RATING_UNAVAILABLE);
        assert_eq!(rating_to_int(Some(&rating(json!("high")))), RATING_UNAVAILABLE);
        assert_eq!(rating_to_int(Some(&rating(json!(null)))), RATING_UNAVAILABLE);
    }
}
