//! Parse configuration files into flat, ordered property maps.
//!
//! Nested documents become dotted keys (`server.port`) and sequences become
//! indexed keys (`hosts[0]`). Keys keep document order.

use indexmap::IndexMap;
use serde::Deserialize;

/// Flat property map in document order
pub type Properties = IndexMap<String, String>;

/// File formats understood by the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Properties,
    Yaml,
    Toml,
    Json,
}

impl Format {
    pub fn from_path(path: &str) -> Option<Self> {
        let (_, ext) = path.rsplit_once('.')?;
        match ext {
            "properties" => Some(Format::Properties),
            "yml" | "yaml" => Some(Format::Yaml),
            "toml" => Some(Format::Toml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

/// Parse `content` according to the extension of `path`
pub fn parse(path: &str, content: &str) -> Result<Properties, String> {
    match Format::from_path(path) {
        Some(Format::Properties) => Ok(parse_properties(content)),
        Some(Format::Yaml) => parse_yaml(content),
        Some(Format::Toml) => parse_toml(content),
        Some(Format::Json) => parse_json(content),
        None => Err("unsupported file extension".to_string()),
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

// ============================================================================
// YAML
// ============================================================================

/// Every document of a multi-document file is read; later documents override
fn parse_yaml(content: &str) -> Result<Properties, String> {
    let mut properties = Properties::new();
    for document in serde_yaml::Deserializer::from_str(content) {
        let value = serde_yaml::Value::deserialize(document).map_err(|e| e.to_string())?;
        flatten_yaml("", &value, &mut properties);
    }
    Ok(properties)
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value;
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Tagged(tagged) => yaml_scalar(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn flatten_yaml(prefix: &str, value: &serde_yaml::Value, out: &mut Properties) {
    use serde_yaml::Value;
    match value {
        Value::Mapping(mapping) => {
            for (key, child) in mapping {
                let key = yaml_scalar(key).unwrap_or_default();
                flatten_yaml(&join(prefix, &key), child, out);
            }
        }
        Value::Sequence(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_yaml(&format!("{}[{}]", prefix, index), child, out);
            }
        }
        Value::Tagged(tagged) => flatten_yaml(prefix, &tagged.value, out),
        scalar => {
            // A bare scalar document has no key to live under
            if !prefix.is_empty() {
                out.insert(prefix.to_string(), yaml_scalar(scalar).unwrap_or_default());
            }
        }
    }
}

// ============================================================================
// JSON
// ============================================================================

fn parse_json(content: &str) -> Result<Properties, String> {
    if content.trim().is_empty() {
        return Ok(Properties::new());
    }
    let value: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err("top-level JSON value must be an object".to_string());
    }
    let mut properties = Properties::new();
    flatten_json("", &value, &mut properties);
    Ok(properties)
}

fn flatten_json(prefix: &str, value: &serde_json::Value, out: &mut Properties) {
    use serde_json::Value;
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_json(&join(prefix, key), child, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_json(&format!("{}[{}]", prefix, index), child, out);
            }
        }
        Value::Null => {
            out.insert(prefix.to_string(), String::new());
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
    }
}

// ============================================================================
// TOML
// ============================================================================

fn parse_toml(content: &str) -> Result<Properties, String> {
    let table: toml::Table = toml::from_str(content).map_err(|e| e.to_string())?;
    let mut properties = Properties::new();
    for (key, child) in &table {
        flatten_toml(key, child, &mut properties);
    }
    Ok(properties)
}

fn flatten_toml(prefix: &str, value: &toml::Value, out: &mut Properties) {
    use toml::Value;
    match value {
        Value::Table(table) => {
            for (key, child) in table {
                flatten_toml(&join(prefix, key), child, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_toml(&format!("{}[{}]", prefix, index), child, out);
            }
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Integer(i) => {
            out.insert(prefix.to_string(), i.to_string());
        }
        Value::Float(f) => {
            out.insert(prefix.to_string(), f.to_string());
        }
        Value::Boolean(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        Value::Datetime(d) => {
            out.insert(prefix.to_string(), d.to_string());
        }
    }
}

// ============================================================================
// Java-style .properties
// ============================================================================

/// Parse `key=value`, `key: value` and `key value` lines with `#`/`!`
/// comments, backslash continuations and the usual escapes. Never fails.
fn parse_properties(content: &str) -> Properties {
    let mut properties = Properties::new();
    let mut logical = String::new();

    for raw in content.lines() {
        let line = raw.trim_start();

        if logical.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }

        if ends_with_continuation(line) {
            logical.push_str(&line[..line.len() - 1]);
            continue;
        }

        logical.push_str(line);
        let (key, value) = split_property(&logical);
        properties.insert(unescape(key), unescape(value));
        logical.clear();
    }

    if !logical.is_empty() {
        let (key, value) = split_property(&logical);
        properties.insert(unescape(key), unescape(value));
    }

    properties
}

/// An odd number of trailing backslashes continues the line
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_property(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (index, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (line[..index].trim_end(), line[index + 1..].trim_start()),
            c if c.is_whitespace() => {
                let key = &line[..index];
                let rest = line[index..].trim_start();
                let rest = rest
                    .strip_prefix(['=', ':'])
                    .map(str::trim_start)
                    .unwrap_or(rest);
                return (key, rest);
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pairs(properties: &Properties) -> Vec<(&str, &str)> {
        properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path("a/b.yml"), Some(Format::Yaml));
        assert_eq!(Format::from_path("b.yaml"), Some(Format::Yaml));
        assert_eq!(Format::from_path("b.properties"), Some(Format::Properties));
        assert_eq!(Format::from_path("b.toml"), Some(Format::Toml));
        assert_eq!(Format::from_path("b.json"), Some(Format::Json));
        assert_eq!(Format::from_path("b.xml"), None);
    }

    #[test]
    fn test_yaml_flattening_keeps_order() {
        let yaml = "server:\n  port: 8080\n  host: localhost\nhosts:\n  - a\n  - b\nenabled: true\nratio: 0.5\nempty:\n";
        let properties = parse("application.yml", yaml).unwrap();
        assert_eq!(
            pairs(&properties),
            vec![
                ("server.port", "8080"),
                ("server.host", "localhost"),
                ("hosts[0]", "a"),
                ("hosts[1]", "b"),
                ("enabled", "true"),
                ("ratio", "0.5"),
                ("empty", ""),
            ]
        );
    }

    #[test]
    fn test_yaml_multi_document_later_wins() {
        let yaml = "a: 1\nb: 1\n---\na: 2\n";
        let properties = parse("application.yml", yaml).unwrap();
        assert_eq!(properties.get("a").map(String::as_str), Some("2"));
        assert_eq!(properties.get("b").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_yaml_empty_file() {
        assert!(parse("application.yml", "").unwrap().is_empty());
        assert!(parse("application.yml", "# only a comment\n").unwrap().is_empty());
    }

    #[test]
    fn test_yaml_malformed() {
        assert!(parse("application.yml", "a: [1, 2\n").is_err());
    }

    #[test]
    fn test_json_flattening() {
        let json = r#"{"db": {"url": "jdbc:x", "pool": [5, 10]}, "debug": false, "none": null}"#;
        let properties = parse("application.json", json).unwrap();
        assert_eq!(
            pairs(&properties),
            vec![
                ("db.url", "jdbc:x"),
                ("db.pool[0]", "5"),
                ("db.pool[1]", "10"),
                ("debug", "false"),
                ("none", ""),
            ]
        );
        assert!(parse("application.json", "[1, 2]").is_err());
        assert!(parse("application.json", "{").is_err());
    }

    #[test]
    fn test_toml_flattening() {
        let toml = "name = \"billing\"\n\n[server]\nport = 9000\nratio = 1.5\n\n[[backends]]\nhost = \"a\"\n";
        let properties = parse("application.toml", toml).unwrap();
        assert_eq!(
            pairs(&properties),
            vec![
                ("name", "billing"),
                ("server.port", "9000"),
                ("server.ratio", "1.5"),
                ("backends[0].host", "a"),
            ]
        );
    }

    #[test]
    fn test_properties_parsing() {
        let content = "# comment\n! also comment\n\na=1\nb : 2\nc 3\nd.e=x=y\nlong=first \\\n    second\nescaped\\=key=v\nunicode=caf\\u00e9\nempty=\n";
        let properties = parse("application.properties", content).unwrap();
        assert_eq!(
            pairs(&properties),
            vec![
                ("a", "1"),
                ("b", "2"),
                ("c", "3"),
                ("d.e", "x=y"),
                ("long", "first second"),
                ("escaped=key", "v"),
                ("unicode", "café"),
                ("empty", ""),
            ]
        );
    }

    #[test]
    fn test_properties_later_duplicate_wins_in_place() {
        let properties = parse("application.properties", "a=1\nb=2\na=3\n").unwrap();
        assert_eq!(pairs(&properties), vec![("a", "3"), ("b", "2")]);
    }

    proptest! {
        #[test]
        fn property_flat_yaml_keeps_every_key_in_order(
            entries in proptest::collection::btree_map("k[a-z]{0,7}", "[a-z0-9]{0,8}", 0..12)
        ) {
            let yaml: String = entries
                .iter()
                .map(|(k, v)| format!("{}: \"{}\"\n", k, v))
                .collect();
            let properties = parse("application.yml", &yaml).unwrap();

            let expected: Vec<(&str, &str)> = entries
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            prop_assert_eq!(pairs(&properties), expected);
        }

        #[test]
        fn property_nested_json_keys_are_dotted(
            outer in "[a-z]{1,6}",
            inner in proptest::collection::btree_map("[a-z]{1,6}", 0i64..1000, 1..6)
        ) {
            let mut object = serde_json::Map::new();
            object.insert(outer.clone(), serde_json::to_value(&inner).unwrap());
            let value = serde_json::Value::Object(object);
            let properties = parse("application.json", &value.to_string()).unwrap();

            prop_assert_eq!(properties.len(), inner.len());
            for (key, number) in &inner {
                let dotted = format!("{}.{}", outer, key);
                prop_assert_eq!(properties.get(&dotted), Some(&number.to_string()));
            }
        }

        #[test]
        fn property_properties_round_trip_simple_pairs(
            entries in proptest::collection::btree_map("[a-z][a-z.]{0,10}", "[A-Za-z0-9 ]{0,12}", 0..10)
        ) {
            let content: String = entries
                .iter()
                .map(|(k, v)| format!("{}={}\n", k, v))
                .collect();
            let properties = parse("application.properties", &content).unwrap();

            prop_assert_eq!(properties.len(), entries.len());
            for (key, value) in &entries {
                prop_assert_eq!(properties.get(key).map(String::as_str), Some(value.trim_start()));
            }
        }
    }
}
