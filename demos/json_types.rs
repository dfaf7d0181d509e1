use regex::Regex;
use xml2json_serde::{xml_str_to_json, Config, JsonArray, JsonType};

fn main() {
    let xml = r#"<a attr1="007"><b attr1="7">true</b><b attr1="8">false</b><c><id>0042</id></c></a>"#;

    // custom config values for 1 attribute, a text node and any `id` element
    let conf = Config::new_with_defaults()
        .add_json_type_override("/a/b/@attr1", JsonArray::Infer(JsonType::AlwaysString))
        .add_json_type_override("/a/b", JsonArray::Infer(JsonType::AlwaysString))
        .add_json_type_override(
            Regex::new(r"/id$").expect("valid regex"),
            JsonArray::Always(JsonType::AlwaysString),
        );
    let json = xml_str_to_json(xml, &conf);
    println!("{}", json.expect("Malformed XML"));
}
