use xml2json_serde::{xml_str_to_json, Config, NullValue};

fn main() {
    let xml = r#"<?xml version="1.0" encoding="utf-8"?><a attr1="1"><b><c attr2="001">some text</c></b></a>"#;
    let conf = Config::new_with_defaults();
    let json = xml_str_to_json(xml, &conf);
    println!("{}", json.expect("Malformed XML"));

    let mut conf = Config::new_with_custom_values(true, "-", "txt", NullValue::Null);
    conf.wrap_root = true;
    let json = xml_str_to_json(xml, &conf);
    println!("{}", json.expect("Malformed XML"));
}
