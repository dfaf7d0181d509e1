//! Converts every `tests/fixtures/*.xml` file and compares it with the
//! `*.json` file next to it. Drop a new pair in the directory to extend it.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use serde_json::Value;
use xml2json_serde::{xml_str_to_json, Config};

#[test]
fn convert_fixture_files() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let mut entries = fs::read_dir(&dir)
        .unwrap()
        .map(|res| res.map(|e| e.path()))
        .collect::<Result<Vec<_>, std::io::Error>>()
        .unwrap();

    entries.sort();

    let conf = Config::new_with_defaults();
    let mut checked = 0;

    for entry in entries {
        // only XML files should be processed
        if entry.extension().and_then(|ext| ext.to_str()) != Some("xml") {
            continue;
        }

        let xml = fs::read_to_string(&entry).unwrap();
        let expected: Value =
            serde_json::from_str(&fs::read_to_string(entry.with_extension("json")).unwrap())
                .unwrap();

        let json = xml_str_to_json(&xml, &conf).unwrap();
        assert_eq!(expected, json, "{}", entry.display());

        // converting again gives the same value
        assert_eq!(json, xml_str_to_json(&xml, &conf).unwrap());
        checked += 1;
    }

    assert_eq!(checked, 3);
}
