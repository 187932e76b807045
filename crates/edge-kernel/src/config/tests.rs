//! Integration tests for layered configuration loading
//!
//! Covers file formats, environment variable substitution and the
//! defaults → file → environment override order.

#[cfg(test)]
mod integration_tests {
    use crate::config::*;
    use serde::{Deserialize, Serialize};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestSettings {
        server: ServerSection,
        functions: FunctionsSection,
        #[serde(default)]
        routes: Vec<RouteSection>,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct ServerSection {
        host: String,
        port: u16,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct FunctionsSection {
        root: String,
        watch: bool,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct RouteSection {
        path: String,
        module: String,
    }

    fn defaults() -> TestSettings {
        TestSettings {
            server: ServerSection {
                host: "127.0.0.1".to_string(),
                port: 8082,
            },
            functions: FunctionsSection {
                root: "functions".to_string(),
                watch: true,
            },
            routes: Vec::new(),
        }
    }

    fn create_test_file(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
        let path = dir.path().join(filename);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_yaml_toml_and_json_load_the_same_settings() {
        let temp_dir = TempDir::new().unwrap();

        let yaml = r#"
server:
  host: 0.0.0.0
  port: 9000
functions:
  root: handlers
  watch: false
routes:
  - path: /api/url-shortener/{code}
    module: url-shortener.rhai
"#;
        let toml = r#"
[server]
host = "0.0.0.0"
port = 9000

[functions]
root = "handlers"
watch = false

[[routes]]
path = "/api/url-shortener/{code}"
module = "url-shortener.rhai"
"#;
        let json = r#"{
    "server": { "host": "0.0.0.0", "port": 9000 },
    "functions": { "root": "handlers", "watch": false },
    "routes": [
        { "path": "/api/url-shortener/{code}", "module": "url-shortener.rhai" }
    ]
}"#;

        let from_yaml: TestSettings =
            load_config(create_test_file(&temp_dir, "gw.yml", yaml)).unwrap();
        let from_toml: TestSettings =
            load_config(create_test_file(&temp_dir, "gw.toml", toml)).unwrap();
        let from_json: TestSettings =
            load_config(create_test_file(&temp_dir, "gw.json", json)).unwrap();

        assert_eq!(from_yaml, from_toml);
        assert_eq!(from_toml, from_json);
        assert_eq!(from_json.server.port, 9000);
        assert_eq!(from_json.routes[0].path, "/api/url-shortener/{code}");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("absent.toml");
        let result: ConfigResult<TestSettings> = load_config(missing);
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_file_overrides_defaults_partially() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_file(&temp_dir, "gw.toml", "[server]\nport = 9100\n");

        let settings: TestSettings = ConfigLoader::new()
            .with_defaults(&defaults())
            .unwrap()
            .with_file(&path)
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.functions.root, "functions");
        assert!(settings.functions.watch);
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_file(&temp_dir, "gw.toml", "[server]\nport = 9100\n");

        unsafe {
            std::env::set_var("EDGETEST_ENV_SERVER__PORT", "9200");
            std::env::set_var("EDGETEST_ENV_FUNCTIONS__WATCH", "false");
        }

        let settings: TestSettings = ConfigLoader::new()
            .with_defaults(&defaults())
            .unwrap()
            .with_file(&path)
            .unwrap()
            .with_env("EDGETEST_ENV")
            .load()
            .unwrap();

        assert_eq!(settings.server.port, 9200);
        assert!(!settings.functions.watch);

        unsafe {
            std::env::remove_var("EDGETEST_ENV_SERVER__PORT");
            std::env::remove_var("EDGETEST_ENV_FUNCTIONS__WATCH");
        }
    }

    #[test]
    fn test_env_var_substitution_braced_and_unbraced() {
        unsafe {
            std::env::set_var("EDGETEST_SUB_ROOT", "/srv/functions");
            std::env::set_var("EDGETEST_SUB_HOST", "0.0.0.0");
        }

        let content = "root = \"${EDGETEST_SUB_ROOT}\"\nhost = \"$EDGETEST_SUB_HOST\"";
        let substituted = substitute_env_vars(content).unwrap();
        assert_eq!(substituted, "root = \"/srv/functions\"\nhost = \"0.0.0.0\"");

        unsafe {
            std::env::remove_var("EDGETEST_SUB_ROOT");
            std::env::remove_var("EDGETEST_SUB_HOST");
        }
    }

    #[test]
    fn test_missing_env_var_preserved() {
        let content = "root = \"${EDGETEST_NEVER_SET_ANYWHERE}\"";
        assert_eq!(substitute_env_vars(content).unwrap(), content);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let result: ConfigResult<TestSettings> =
            from_str("[server\nport = ", Format::Toml);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_wrong_type_is_serialization_error() {
        let result: ConfigResult<TestSettings> = ConfigLoader::new()
            .with_defaults(&defaults())
            .unwrap()
            .with_str("[server]\nport = \"not-a-port\"\n", Format::Toml)
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::Serialization(_))));
    }
}
