//! Variable mappings from files and `--set` assignments.

use std::path::Path;

use anyhow::{bail, Context, Result};
use forge_template::{variables_from_json_str, variables_from_yaml_str, Value, Variables};
use tracing::debug;

use crate::VarArgs;

/// Builds the mapping: the `--vars` file (if any), then each `--set` in order.
pub fn load(args: &VarArgs) -> Result<Variables> {
    let mut vars = match &args.vars_file {
        Some(path) => load_file(path)?,
        None => Variables::new(),
    };

    for assignment in &args.assignments {
        let (key, value) = parse_assignment(assignment)?;
        vars.insert(key, value);
    }

    debug!(count = vars.len(), "loaded variables");
    Ok(vars)
}

/// Returns true if any variable source was given.
pub fn supplied(args: &VarArgs) -> bool {
    args.vars_file.is_some() || !args.assignments.is_empty()
}

/// Reads a JSON or YAML variable file, chosen by extension.
///
/// Unknown extensions are tried as JSON, then YAML.
pub fn load_file(path: &Path) -> Result<Variables> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading variables from {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let parsed = match extension.as_deref() {
        Some("json") => variables_from_json_str(&source),
        Some("yaml") | Some("yml") => variables_from_yaml_str(&source),
        _ => variables_from_json_str(&source).or_else(|_| variables_from_yaml_str(&source)),
    };
    parsed.with_context(|| format!("parsing variables from {}", path.display()))
}

/// Splits `KEY=VALUE` on the first `=`.
pub fn parse_assignment(assignment: &str) -> Result<(String, Value)> {
    let Some((key, value)) = assignment.split_once('=') else {
        bail!("invalid assignment {:?}: expected KEY=VALUE", assignment);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("invalid assignment {:?}: empty key", assignment);
    }
    Ok((key.to_string(), parse_scalar(value)))
}

/// Interprets a command-line value.
///
/// `true`/`false` become booleans, integers become `Int`, decimals with a
/// `.` become `Float`, and everything else stays a string.
pub fn parse_scalar(value: &str) -> Value {
    match value {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = value.parse::<i64>() {
        return Value::Int(n);
    }
    if value.contains('.') {
        if let Ok(n) = value.parse::<f64>() {
            return Value::Float(n);
        }
    }
    Value::from(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn scalars() {
        assert_eq!(parse_scalar("true"), Value::Bool(true));
        assert_eq!(parse_scalar("false"), Value::Bool(false));
        assert_eq!(parse_scalar("42"), Value::Int(42));
        assert_eq!(parse_scalar("-7"), Value::Int(-7));
        assert_eq!(parse_scalar("2.5"), Value::Float(2.5));
        assert_eq!(parse_scalar("PlayerHealth"), Value::from("PlayerHealth"));
        assert_eq!(parse_scalar("1.2.3"), Value::from("1.2.3"));
        assert_eq!(parse_scalar("inf"), Value::from("inf"));
        assert_eq!(parse_scalar("True"), Value::from("True"));
        assert_eq!(parse_scalar(""), Value::from(""));
    }

    #[test]
    fn assignments_split_on_first_equals() {
        let (key, value) = parse_assignment("EXPR=a==b").unwrap();
        assert_eq!(key, "EXPR");
        assert_eq!(value, Value::from("a==b"));

        assert!(parse_assignment("NO_EQUALS").is_err());
        assert!(parse_assignment("=value").is_err());
    }

    #[test]
    fn files_by_extension() {
        let dir = TempDir::new().unwrap();
        let json = dir.path().join("vars.json");
        let yaml = dir.path().join("vars.yml");
        let other = dir.path().join("vars.conf");
        std::fs::write(&json, r#"{"CLASS_NAME": "Door", "LOCKED": true}"#).unwrap();
        std::fs::write(&yaml, "CLASS_NAME: Door\nSPEED: 1.5\n").unwrap();
        std::fs::write(&other, "CLASS_NAME: Gate\n").unwrap();

        let vars = load_file(&json).unwrap();
        assert_eq!(vars["LOCKED"], Value::Bool(true));

        let vars = load_file(&yaml).unwrap();
        assert_eq!(vars["SPEED"], Value::Float(1.5));

        let vars = load_file(&other).unwrap();
        assert_eq!(vars["CLASS_NAME"], Value::from("Gate"));
    }

    #[test]
    fn non_mapping_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vars.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn assignments_override_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vars.yaml");
        std::fs::write(&path, "CLASS_NAME: Door\nHP: 10\n").unwrap();

        let args = VarArgs {
            vars_file: Some(path),
            assignments: vec!["HP=25".to_string(), "USE_EVENTS=true".to_string()],
        };
        let vars = load(&args).unwrap();
        assert_eq!(vars["CLASS_NAME"], Value::from("Door"));
        assert_eq!(vars["HP"], Value::Int(25));
        assert_eq!(vars["USE_EVENTS"], Value::Bool(true));
        assert!(supplied(&args));
        assert!(!supplied(&VarArgs::default()));
    }
}
