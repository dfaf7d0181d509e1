//! Scalar coercion of XML text into JSON values.

use serde_json::Value;

use crate::config::{Config, JsonType};
use crate::value::number_from_literal;

/// Returns the text as one of `serde_json::Value` scalar types: null, bool, number or string.
///
/// With `JsonType::Infer` the checks run in this order: empty or whitespace-only
/// text, booleans, numbers, and finally the text itself as a string. Only the
/// inference checks look at trimmed text; a string keeps its whitespace unless
/// `trim_text` is set.
pub fn parse_text(text: &str, config: &Config, json_type: &JsonType) -> Value {
    let text = if config.trim_text { text.trim() } else { text };

    match json_type {
        // enforce JSON String data type regardless of the underlying type
        JsonType::AlwaysString => return Value::String(text.into()),
        // anything outside the list of `true` values is false
        JsonType::Bool(true_values) => {
            let text = text.trim();
            return Value::Bool(true_values.iter().any(|v| v == text));
        }
        JsonType::Infer => {}
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return if config.empty_as_null {
            Value::Null
        } else {
            Value::String(String::new())
        };
    }

    if config.infer_booleans {
        if trimmed.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
    }

    if config.infer_numbers {
        if let Some(number) = number_from_literal(trimmed) {
            return Value::Number(number);
        }
    }

    Value::String(text.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn infer(text: &str) -> Value {
        parse_text(text, &Config::new_with_defaults(), &JsonType::Infer)
    }

    #[test]
    fn test_parse_text() {
        assert_eq!(json!(0), infer("0"));
        assert_eq!(json!(1), infer("1"));
        assert_eq!(json!(-17), infer("-17"));
        assert_eq!("0.0", infer("0.0").to_string());
        assert_eq!("0.4200", infer("0.4200").to_string());
        assert_eq!("142.4200", infer("142.4200").to_string());
        assert_eq!("1e-7", infer("1e-7").to_string());
        assert_eq!("0000", infer("0000"));
        assert_eq!("0xAC", infer("0xAC"));
        assert_eq!("0x03", infer("0x03"));
        assert_eq!("142,4200", infer("142,4200"));
        assert_eq!("142,420,0.0", infer("142,420,0.0"));
        assert_eq!("0Test", infer("0Test"));
        assert_eq!("0.Test", infer("0.Test"));
        assert_eq!("0.22Test", infer("0.22Test"));
        assert_eq!("0044951", infer("0044951"));
        assert_eq!("+5", infer("+5"));
        assert_eq!("NaN", infer("NaN"));
        assert_eq!("Infinity", infer("Infinity"));
        assert_eq!(false, infer("false"));
        assert_eq!(true, infer("true"));
        assert_eq!(true, infer("True"));
        assert_eq!(false, infer("FALSE"));
        assert_eq!("yes", infer("yes"));
    }

    #[test]
    fn test_numbers_keep_their_literal() {
        let big = "123456789012345678901234567890";
        let value = infer(big);
        assert!(value.is_number());
        assert_eq!(value.to_string(), big);

        let value = infer("18446744073709551615");
        assert_eq!(value.as_u64(), Some(u64::MAX));

        // exponents are written back with a lowercase `e` and an explicit sign
        let value = infer("1e400");
        assert!(value.is_number());
        assert_eq!(value.to_string(), "1e+400");
    }

    #[test]
    fn test_inference_ignores_surrounding_whitespace() {
        assert_eq!(json!(42), infer("  42\n"));
        assert_eq!(true, infer(" true "));
        // strings keep the fragment as provided
        assert_eq!(" hello ", infer(" hello "));
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(Value::Null, infer(""));
        assert_eq!(Value::Null, infer(" \n\t"));

        let mut config = Config::new_with_defaults();
        config.empty_as_null = false;
        assert_eq!("", parse_text("", &config, &JsonType::Infer));
        assert_eq!("", parse_text("   ", &config, &JsonType::Infer));
    }

    #[test]
    fn test_inference_can_be_disabled() {
        let mut config = Config::new_with_defaults();
        config.infer_numbers = false;
        assert_eq!("42", parse_text("42", &config, &JsonType::Infer));
        assert_eq!(true, parse_text("true", &config, &JsonType::Infer));

        config.infer_numbers = true;
        config.infer_booleans = false;
        assert_eq!("true", parse_text("true", &config, &JsonType::Infer));
        assert_eq!(json!(42), parse_text("42", &config, &JsonType::Infer));
    }

    #[test]
    fn test_trim_text() {
        let mut config = Config::new_with_defaults();
        config.trim_text = true;
        assert_eq!("hello", parse_text("  hello ", &config, &JsonType::Infer));
        assert_eq!("abc", parse_text(" abc ", &config, &JsonType::AlwaysString));
    }

    #[test]
    fn test_json_type_overrides() {
        let config = Config::new_with_defaults();

        // always enforce JSON bool type
        let bool_type = JsonType::Bool(vec!["true".into(), "True".into(), "".into(), "1".into()]);
        assert_eq!(false, parse_text("false", &config, &bool_type));
        assert_eq!(true, parse_text("true", &config, &bool_type));
        assert_eq!(true, parse_text("True", &config, &bool_type));
        assert_eq!(false, parse_text("TRUE", &config, &bool_type));
        assert_eq!(true, parse_text("", &config, &bool_type));
        assert_eq!(true, parse_text(" 1 ", &config, &bool_type));
        assert_eq!(false, parse_text("0", &config, &bool_type));

        // always enforce JSON string type
        assert_eq!("abc", parse_text("abc", &config, &JsonType::AlwaysString));
        assert_eq!("true", parse_text("true", &config, &JsonType::AlwaysString));
        assert_eq!("123", parse_text("123", &config, &JsonType::AlwaysString));
        assert_eq!("0.4200", parse_text("0.4200", &config, &JsonType::AlwaysString));
        assert_eq!("", parse_text("", &config, &JsonType::AlwaysString));
    }
}
