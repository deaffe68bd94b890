//! Request and response shape shared by the LLM clients
//!
//! Texts travel as a JSON object keyed by their batch index, wrapped in
//! `{"sourceLocale", "targetLocale", "data"}`. The model is primed with one
//! worked example and must answer with the same wrapper.

use crate::error::{TranslateError, TranslateResult};
use crate::locked_patterns::TOKEN_PREFIX;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an advanced localization engine. \
Translate every value of the `data` object from {source} to {target}. \
Keep the keys exactly as they are. \
Copy every token that starts with {token} verbatim, including its surrounding dashes. \
Keep markdown, HTML and whitespace structure intact. \
Answer with a single JSON object of the form {\"sourceLocale\", \"targetLocale\", \"data\"} and nothing else.";

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Message {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Fill `{source}`, `{target}` and `{token}` into a system prompt
pub fn render_system_prompt(template: &str, source_locale: &str, target_locale: &str) -> String {
    template
        .replace("{source}", source_locale)
        .replace("{target}", target_locale)
        .replace("{token}", TOKEN_PREFIX)
}

fn payload(source_locale: &str, target_locale: &str, data: &IndexMap<String, String>) -> String {
    json!({
        "sourceLocale": source_locale,
        "targetLocale": target_locale,
        "data": data,
    })
    .to_string()
}

/// Conversation for one batch: the worked example then the real request
///
/// The system prompt is returned separately since some APIs take it outside
/// the message list.
pub fn build_messages(
    template: &str,
    texts: &[String],
    source_locale: &str,
    target_locale: &str,
) -> (String, Vec<Message>) {
    let system = render_system_prompt(template, source_locale, target_locale);

    let shot_in = IndexMap::from([("message".to_string(), "Hello, world!".to_string())]);
    let shot_out = IndexMap::from([("message".to_string(), "Hola, mundo!".to_string())]);
    let data: IndexMap<String, String> = texts
        .iter()
        .enumerate()
        .map(|(index, text)| (index.to_string(), text.clone()))
        .collect();

    let messages = vec![
        Message::new("user", payload("en", "es", &shot_in)),
        Message::new("assistant", payload("en", "es", &shot_out)),
        Message::new("user", payload(source_locale, target_locale, &data)),
    ];
    (system, messages)
}

/// Outermost `{...}` span of a reply that wrapped its JSON in prose or fences
fn outer_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Pull the translated texts out of a model reply, in batch order
pub fn parse_reply(reply: &str, expected: usize) -> TranslateResult<Vec<String>> {
    let invalid = |detail: &str| {
        TranslateError::Translation(format!("Unusable model reply ({}): {}", detail, reply))
    };

    let parsed: Value = serde_json::from_str(reply.trim())
        .or_else(|_| serde_json::from_str(outer_object(reply).unwrap_or_default()))
        .map_err(|_| invalid("not JSON"))?;

    let data = match &parsed["data"] {
        Value::Object(map) => Value::Object(map.clone()),
        // Some models double-encode the data object
        Value::String(text) => serde_json::from_str::<Value>(outer_object(text).unwrap_or_default())
            .map_err(|_| invalid("data is not an object"))?,
        _ => return Err(invalid("missing data")),
    };

    let results: Vec<String> = (0..expected)
        .map(|index| {
            data[index.to_string().as_str()]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(&format!("missing key {}", index)))
        })
        .collect::<TranslateResult<_>>()?;

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_system_prompt() {
        let prompt = render_system_prompt(DEFAULT_SYSTEM_PROMPT, "en", "fr");
        assert!(prompt.contains("from en to fr"));
        assert!(prompt.contains(TOKEN_PREFIX));
        assert!(!prompt.contains("{source}"));
    }

    #[test]
    fn test_build_messages_payload() {
        let texts = vec!["Hello".to_string(), "Bye".to_string()];
        let (system, messages) = build_messages(DEFAULT_SYSTEM_PROMPT, &texts, "en", "de");
        assert!(system.contains("to de"));
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, "assistant");

        let request: Value = serde_json::from_str(&messages[2].content).unwrap();
        assert_eq!(request["targetLocale"], "de");
        assert_eq!(request["data"]["0"], "Hello");
        assert_eq!(request["data"]["1"], "Bye");
    }

    #[test]
    fn test_parse_reply_object() {
        let reply = r#"{"sourceLocale":"en","targetLocale":"fr","data":{"1":"Salut","0":"Bonjour"}}"#;
        assert_eq!(parse_reply(reply, 2).unwrap(), vec!["Bonjour", "Salut"]);
    }

    #[test]
    fn test_parse_reply_wrapped_in_prose() {
        let reply = "Sure! ```json\n{\"data\":{\"0\":\"Hallo\"}}\n```";
        assert_eq!(parse_reply(reply, 1).unwrap(), vec!["Hallo"]);
    }

    #[test]
    fn test_parse_reply_double_encoded() {
        let reply = r#"{"data":"{\"0\":\"Hola\"}"}"#;
        assert_eq!(parse_reply(reply, 1).unwrap(), vec!["Hola"]);
    }

    #[test]
    fn test_parse_reply_missing_key() {
        let reply = r#"{"data":{"0":"Hola"}}"#;
        assert!(matches!(
            parse_reply(reply, 2),
            Err(TranslateError::Translation(_))
        ));
        assert!(parse_reply("no json here", 1).is_err());
    }
}
