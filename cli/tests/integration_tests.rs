use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("schema_docs_cli_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn schema_docs(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_schema-docs"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run schema-docs")
}

/// Link click schema with a nested object and an array.
fn write_link_click(dir: &TempDir) -> PathBuf {
    let json = serde_json::json!({
        "self": {
            "vendor": "com.snowplowanalytics.snowplow",
            "name": "link_click",
            "format": "jsonschema",
            "version": "1-0-1"
        },
        "description": "Stores the event of a user clicking a link",
        "properties": {
            "elementId": {"type": "string", "description": "Id of the clicked element"},
            "elementClasses": {"type": ["array", "null"], "items": {"type": "string"}},
            "targetUrl": {"type": "string", "description": "The target URL"},
            "position": {
                "type": "object",
                "properties": {"x": {"type": "integer"}, "y": {"type": ["null", "number"]}}
            }
        }
    });
    let path = dir.join("link_click-1-0-1.json");
    fs::write(&path, serde_json::to_string_pretty(&json).unwrap())
        .expect("failed to write schema");
    path
}

fn write_config(dir: &TempDir) -> PathBuf {
    let yaml = r#"models_prefix: snowplow
models:
  - event_names: [link_click]
    event_columns: [page_url]
    self_describing_event_schemas: [link_click-1-0-1.json]
    filters: ["$.properties.elementId"]
"#;
    let path = dir.join("schema-docs.yml");
    fs::write(&path, yaml).expect("failed to write config");
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

#[test]
fn generate_writes_documentation_file() {
    let dir = TempDir::new("generate_writes");
    write_link_click(&dir);
    let config = write_config(&dir);
    let docs = dir.join("models/docs.yml");

    let output = schema_docs(&[
        "generate",
        "--config",
        config.to_str().unwrap(),
        "--docs",
        docs.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = fs::read_to_string(&docs).expect("docs file should exist");
    let document: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
    assert_eq!(document["version"].as_i64(), Some(2));
    let table = &document["models"][0];
    assert_eq!(table["name"].as_str(), Some("snowplow_link_click_1"));

    let columns: Vec<&str> = table["columns"]
        .as_sequence()
        .unwrap()
        .iter()
        .map(|column| column["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        columns,
        vec![
            "event_id",
            "collector_tstamp",
            "page_url",
            "element_classes",
            "position.x",
            "position.y",
            "target_url",
        ]
    );
}

#[test]
fn generate_preserves_hand_edits() {
    let dir = TempDir::new("generate_edits");
    write_link_click(&dir);
    let config = write_config(&dir);
    let docs = dir.join("docs.yml");
    let args = [
        "generate",
        "--config",
        config.to_str().unwrap(),
        "--docs",
        docs.to_str().unwrap(),
    ];

    assert!(schema_docs(&args).status.success());
    let first = fs::read_to_string(&docs).unwrap();
    let edited = first.replace(
        "  - name: event_id\n",
        "  - name: event_id\n    tests:\n    - unique\n",
    );
    assert_ne!(first, edited, "fixture edit should apply");
    fs::write(&docs, &edited).unwrap();

    assert!(schema_docs(&args).status.success());
    let second = fs::read_to_string(&docs).unwrap();
    assert_eq!(second, edited);
}

#[test]
fn generate_counts_only_models_with_tables() {
    let dir = TempDir::new("generate_count");
    write_link_click(&dir);
    let config = dir.join("config.yml");
    fs::write(
        &config,
        "models:\n  - event_names: [link_click]\n    self_describing_event_schemas: [link_click-1-0-1.json]\n  - event_names: [page_ping]\n",
    )
    .unwrap();
    let docs = dir.join("docs.yml");

    let output = schema_docs(&[
        "generate",
        "--config",
        config.to_str().unwrap(),
        "--docs",
        docs.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(
        stdout(&output).starts_with("Documented 1 model(s) in "),
        "stdout: {}",
        stdout(&output)
    );
}

#[test]
fn generate_with_no_tables_writes_nothing() {
    let dir = TempDir::new("generate_none");
    let config = dir.join("config.yml");
    fs::write(&config, "models:\n  - event_names: [page_ping]\n").unwrap();
    let docs = dir.join("docs.yml");

    let output = schema_docs(&[
        "generate",
        "--config",
        config.to_str().unwrap(),
        "--docs",
        docs.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("nothing written"));
    assert!(!docs.exists());
}

#[test]
fn generate_dry_run_does_not_write() {
    let dir = TempDir::new("generate_dry_run");
    write_link_click(&dir);
    let config = write_config(&dir);
    let docs = dir.join("docs.yml");

    let output = schema_docs(&[
        "generate",
        "--config",
        config.to_str().unwrap(),
        "--docs",
        docs.to_str().unwrap(),
        "--dry-run",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(!docs.exists());
    assert!(stdout(&output).contains("name: snowplow_link_click_1"));
}

#[test]
fn generate_rejects_unparsable_document() {
    let dir = TempDir::new("generate_bad_docs");
    write_link_click(&dir);
    let config = write_config(&dir);
    let docs = dir.join("docs.yml");
    let garbage = "version: 2\nmodels: [oops\n";
    fs::write(&docs, garbage).unwrap();

    let output = schema_docs(&[
        "generate",
        "--config",
        config.to_str().unwrap(),
        "--docs",
        docs.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("error: invalid documentation file"));
    assert_eq!(fs::read_to_string(&docs).unwrap(), garbage);
}

#[test]
fn generate_reports_bad_filter() {
    let dir = TempDir::new("generate_bad_filter");
    write_link_click(&dir);
    let config = dir.join("config.yml");
    fs::write(
        &config,
        "models:\n  - event_names: [link_click]\n    self_describing_event_schemas: [link_click-1-0-1.json]\n    filters: [\"properties.x\"]\n",
    )
    .unwrap();

    let output = schema_docs(&[
        "generate",
        "--config",
        config.to_str().unwrap(),
        "--docs",
        dir.join("docs.yml").to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("invalid filter"));
    assert!(!dir.join("docs.yml").exists());
}

// ---------------------------------------------------------------------------
// flatten
// ---------------------------------------------------------------------------

#[test]
fn flatten_prints_fields_as_json() {
    let dir = TempDir::new("flatten_json");
    let schema = write_link_click(&dir);

    let output = schema_docs(&["flatten", "--schema", schema.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let fields: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let fields = fields.as_array().unwrap();
    let paths: Vec<&str> = fields.iter().map(|f| f["path"].as_str().unwrap()).collect();
    assert_eq!(
        paths,
        vec!["elementClasses", "elementId", "position.x", "position.y", "targetUrl"]
    );
    assert_eq!(fields[0]["schema_type"], "array");
    assert_eq!(fields[3]["schema_type"], "number");
}

#[test]
fn flatten_shallow_with_filter_as_yaml() {
    let dir = TempDir::new("flatten_yaml");
    let schema = write_link_click(&dir);

    let output = schema_docs(&[
        "flatten",
        "--schema",
        schema.to_str().unwrap(),
        "--shallow",
        "--filter",
        "$..elementClasses",
        "--format",
        "yaml",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let fields: serde_yaml::Value = serde_yaml::from_str(&stdout(&output)).unwrap();
    let paths: Vec<&str> = fields
        .as_sequence()
        .unwrap()
        .iter()
        .map(|f| f["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["elementId", "position", "targetUrl"]);
}

// ---------------------------------------------------------------------------
// names
// ---------------------------------------------------------------------------

#[test]
fn names_lists_model_names() {
    let dir = TempDir::new("names");
    let config = dir.join("config.json");
    fs::write(
        &config,
        serde_json::to_string(&serde_json::json!({
            "models_prefix": "",
            "models": [
                {"event_names": ["page_ping"], "version": "2-0-0"},
                {"event_names": ["a", "b"], "table_name": "combined"}
            ]
        }))
        .unwrap(),
    )
    .unwrap();

    let output = schema_docs(&["names", "--config", config.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "page_ping_2\ncombined_1\n");
}

#[test]
fn names_rejects_missing_config() {
    let output = schema_docs(&["names", "--config", "/nonexistent/config.yml"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("error:"));
}
