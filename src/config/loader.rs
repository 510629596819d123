//! Configuration loading and environment parsing.

use super::validation::validate_config;
use super::Config;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

const ENV_PREFIX: &str = "BLINDCALL__";

/// Load configuration with the following precedence (highest first):
/// 1) `BLINDCALL_CONFIG_JSON` env var containing raw JSON
/// 2) If `BLINDCALL_CONFIG_STDIN=true/1`, read JSON from stdin
/// 3) File pointed to by `BLINDCALL_CONFIG_PATH`
/// 4) config.json in the current working directory
/// 5) config.json next to the executable
/// 6) Defaults compiled into the binary
///
/// Individual fields can then be overridden with `BLINDCALL__SECTION__FIELD`
/// variables, e.g. `BLINDCALL__LOGGING__LEVEL=debug`. The conventional `PORT`
/// variable sets the port when `BLINDCALL__PORT` is absent.
///
/// Read and parse failures are reported on stderr and the affected source is
/// skipped. A field whose merged value does not fit its type keeps its default
/// and every other field is kept. Validation failures are also only reported here; `main` calls
/// [`validate_config`] again and exits on error.
#[must_use]
pub fn load() -> Config {
    use std::env;
    use std::io::Read;
    use std::path::PathBuf;

    let defaults = serde_json::to_value(Config::default()).unwrap_or_else(|_| Value::Object(Map::new()));
    let mut merged = defaults.clone();

    // Sources are merged lowest precedence first so later ones win.
    if let Ok(exe_path) = env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            merge_file_source(&mut merged, &exe_dir.join("config.json"));
        }
    }

    merge_file_source(&mut merged, &PathBuf::from("config.json"));

    if let Ok(path) = env::var("BLINDCALL_CONFIG_PATH") {
        merge_file_source(&mut merged, &PathBuf::from(path));
    }

    if env::var("BLINDCALL_CONFIG_STDIN").is_ok_and(|val| env_var_truthy(&val)) {
        let mut buf = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
            eprintln!("Failed to read config from stdin: {e}");
        } else if let Some(value) = parse_json_document(&buf, "stdin") {
            merge_values(&mut merged, value);
        }
    }

    if let Ok(json) = env::var("BLINDCALL_CONFIG_JSON") {
        if let Some(value) = parse_json_document(&json, "BLINDCALL_CONFIG_JSON") {
            merge_values(&mut merged, value);
        }
    }

    apply_env_overrides(&mut merged, env::vars());
    apply_port_fallback(&mut merged, env::var("PORT").ok().as_deref());

    let config = match Config::deserialize(&merged) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to deserialize config, keeping valid fields: {e}");
            salvage_fields(&defaults, merged)
        }
    };

    if let Err(e) = validate_config(&config) {
        eprintln!("Configuration validation error: {e}");
    }

    config
}

fn parse_json_document(raw: &str, label: &str) -> Option<Value> {
    if raw.trim().is_empty() {
        return None;
    }

    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            eprintln!("Failed to parse config from {label}: {err}");
            None
        }
    }
}

fn merge_file_source(target: &mut Value, path: &Path) {
    if path.as_os_str().is_empty() || !path.exists() {
        return;
    }

    match fs::read_to_string(path) {
        Ok(contents) => {
            if let Some(value) = parse_json_document(&contents, &format!("file {}", path.display()))
            {
                merge_values(target, value);
            }
        }
        Err(err) => {
            eprintln!("Failed to read config from {}: {}", path.display(), err);
        }
    }
}

/// Deep-merge `source` into `target`; objects merge key by key, anything else
/// replaces.
fn merge_values(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target_slot, source_value) => {
            *target_slot = source_value;
        }
    }
}

/// Rebuild the config one field at a time on top of the defaults, dropping
/// only the fields that fail to deserialize.
fn salvage_fields(defaults: &Value, merged: Value) -> Config {
    let mut accepted = defaults.clone();

    if let Value::Object(sections) = merged {
        for (key, value) in sections {
            match value {
                Value::Object(fields) if accepted.get(&key).is_some_and(Value::is_object) => {
                    for (field, field_value) in fields {
                        accept_field(&mut accepted, &[key.clone(), field], field_value);
                    }
                }
                other => accept_field(&mut accepted, &[key], other),
            }
        }
    }

    Config::deserialize(&accepted).unwrap_or_default()
}

fn accept_field(accepted: &mut Value, path: &[String], value: Value) {
    let mut candidate = accepted.clone();
    set_nested_value(&mut candidate, path, value);
    match Config::deserialize(&candidate) {
        Ok(_) => *accepted = candidate,
        Err(err) => eprintln!("Ignoring invalid config value at {}: {err}", path.join(".")),
    }
}

fn apply_env_overrides(root: &mut Value, vars: impl IntoIterator<Item = (String, String)>) {
    for (key, raw_value) in vars {
        let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };

        let segments: Vec<String> = stripped
            .split("__")
            .filter(|segment| !segment.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();

        if segments.is_empty() {
            continue;
        }

        let value = parse_env_value(&raw_value, lookup(root, &segments));
        set_nested_value(root, &segments, value);
    }
}

fn lookup<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |value, segment| value.get(segment))
}

fn apply_port_fallback(root: &mut Value, port: Option<&str>) {
    if std::env::var_os(format!("{ENV_PREFIX}PORT")).is_some() {
        return;
    }
    let Some(raw) = port else {
        return;
    };
    match raw.trim().parse::<u16>() {
        Ok(port) => set_nested_value(root, &["port".to_string()], Value::from(port)),
        Err(err) => eprintln!("Ignoring PORT={raw:?}: {err}"),
    }
}

fn env_var_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

/// Type an override after the value it replaces. String and optional fields
/// keep the raw text (commas included); other fields parse as JSON scalars.
fn parse_env_value(raw: &str, current: Option<&Value>) -> Value {
    let trimmed = raw.trim();
    match current {
        Some(Value::String(_) | Value::Null) => Value::String(trimmed.to_string()),
        _ => parse_scalar(trimmed),
    }
}

fn parse_scalar(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::String(String::new());
    }

    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn set_nested_value(target: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *target = value;
        return;
    };

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let Value::Object(map) = target else {
        return;
    };

    if rest.is_empty() {
        map.insert(head.clone(), value);
    } else {
        let entry = map
            .entry(head.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        set_nested_value(entry, rest, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;
    use std::io::Write;

    const MANAGED_VARS: &[&str] = &[
        "BLINDCALL_CONFIG_JSON",
        "BLINDCALL_CONFIG_PATH",
        "BLINDCALL_CONFIG_STDIN",
        "BLINDCALL__PORT",
        "BLINDCALL__SECURITY__MAX_CONNECTIONS_PER_IP",
        "BLINDCALL__SECURITY__CORS_ORIGINS",
        "BLINDCALL__SECURITY__METRICS_AUTH_TOKEN",
        "PORT",
    ];

    fn clear_env() {
        for var in MANAGED_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn merge_replaces_scalars_and_keeps_siblings() {
        let mut target = json!({"port": 3000, "security": {"cors_origins": "*", "max_message_size": 10}});
        merge_values(&mut target, json!({"security": {"max_message_size": 20}}));
        assert_eq!(
            target,
            json!({"port": 3000, "security": {"cors_origins": "*", "max_message_size": 20}})
        );
    }

    #[test]
    fn env_overrides_create_nested_keys() {
        let mut root = json!({});
        apply_env_overrides(
            &mut root,
            vec![
                ("BLINDCALL__LOGGING__LEVEL".to_string(), "debug".to_string()),
                ("BLINDCALL__SERVER__OUTBOUND_QUEUE_CAPACITY".to_string(), "8".to_string()),
                ("UNRELATED".to_string(), "1".to_string()),
            ],
        );
        assert_eq!(
            root,
            json!({"logging": {"level": "debug"}, "server": {"outbound_queue_capacity": 8}})
        );
    }

    #[test]
    fn env_values_follow_the_type_they_replace() {
        assert_eq!(parse_env_value("true", Some(&json!(false))), json!(true));
        assert_eq!(parse_env_value("42", Some(&json!(3000))), json!(42));
        assert_eq!(parse_env_value("42", None), json!(42));
        assert_eq!(
            parse_env_value("https://a,https://b", Some(&json!("*"))),
            json!("https://a,https://b")
        );
        assert_eq!(parse_env_value(" 12345 ", Some(&Value::Null)), json!("12345"));
    }

    #[test]
    fn bad_field_keeps_its_default_and_the_rest_survives() {
        let defaults = serde_json::to_value(Config::default()).unwrap();
        let merged = json!({
            "port": 4300,
            "security": {"max_message_size": "huge", "require_metrics_auth": true},
            "logging": {"format": "xml"}
        });

        let config = salvage_fields(&defaults, merged);

        assert_eq!(config.port, 4300);
        assert!(config.security.require_metrics_auth);
        assert_eq!(config.security.max_message_size, 65_536);
        assert_eq!(config.logging.format, Config::default().logging.format);
    }

    #[test]
    #[serial]
    fn comma_separated_cors_override_keeps_other_sources() {
        clear_env();
        std::env::set_var(
            "BLINDCALL_CONFIG_JSON",
            r#"{"port": 4200, "security": {"require_metrics_auth": true, "metrics_auth_token": "secret"}}"#,
        );
        std::env::set_var("BLINDCALL__SECURITY__CORS_ORIGINS", "https://a,https://b");

        let config = load();
        clear_env();

        assert_eq!(config.port, 4200);
        assert!(config.security.require_metrics_auth);
        assert_eq!(config.security.metrics_auth_token.as_deref(), Some("secret"));
        assert_eq!(config.security.cors_origins, "https://a,https://b");
    }

    #[test]
    #[serial]
    fn numeric_token_override_stays_a_string() {
        clear_env();
        std::env::set_var("BLINDCALL__SECURITY__METRICS_AUTH_TOKEN", "12345");

        let config = load();
        clear_env();

        assert_eq!(config.security.metrics_auth_token.as_deref(), Some("12345"));
    }

    #[test]
    #[serial]
    fn load_reads_file_then_env_overrides() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"port": 4100, "matchmaking": {{"max_interests": 4}}, "security": {{"max_connections_per_ip": 2}}}}"#
        )
        .unwrap();
        std::env::set_var("BLINDCALL_CONFIG_PATH", file.path());
        std::env::set_var("BLINDCALL__SECURITY__MAX_CONNECTIONS_PER_IP", "5");

        let config = load();
        clear_env();

        assert_eq!(config.port, 4100);
        assert_eq!(config.matchmaking.max_interests, 4);
        assert_eq!(config.security.max_connections_per_ip, 5);
        assert_eq!(config.server.outbound_queue_capacity, 64);
    }

    #[test]
    #[serial]
    fn inline_json_wins_over_file() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"port": 4100}}"#).unwrap();
        std::env::set_var("BLINDCALL_CONFIG_PATH", file.path());
        std::env::set_var("BLINDCALL_CONFIG_JSON", r#"{"port": 4200}"#);

        let config = load();
        clear_env();

        assert_eq!(config.port, 4200);
    }

    #[test]
    #[serial]
    fn plain_port_variable_applies_unless_prefixed_override_present() {
        clear_env();
        std::env::set_var("PORT", "8081");
        assert_eq!(load().port, 8081);

        std::env::set_var("BLINDCALL__PORT", "8082");
        assert_eq!(load().port, 8082);

        std::env::remove_var("BLINDCALL__PORT");
        std::env::set_var("PORT", "not-a-port");
        assert_eq!(load().port, 3000);
        clear_env();
    }

    #[test]
    #[serial]
    fn malformed_json_falls_back_to_defaults() {
        clear_env();
        std::env::set_var("BLINDCALL_CONFIG_JSON", "{not json");
        let config = load();
        clear_env();
        assert_eq!(config.port, 3000);
    }
}
