//! JSON Schema validation for dataset rows.
//!
//! Each dataset kind has a schema embedded at compile time. Validators are
//! compiled on first use and reused for every row.

use std::sync::OnceLock;

use super::rows::DatasetKind;

const GOLDEN_SCHEMA_JSON: &str = include_str!("../../schemas/golden.schema.json");
const RULES_SCHEMA_JSON: &str = include_str!("../../schemas/rules.schema.json");
const JUDGE_SCHEMA_JSON: &str = include_str!("../../schemas/judge.schema.json");

static GOLDEN_VALIDATOR: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();
static RULES_VALIDATOR: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();
static JUDGE_VALIDATOR: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn compile(schema_json: &str) -> Result<jsonschema::Validator, String> {
    let schema_value: serde_json::Value = serde_json::from_str(schema_json)
        .map_err(|e| format!("Invalid schema JSON: {}", e))?;

    jsonschema::options()
        .build(&schema_value)
        .map_err(|e| format!("Failed to compile schema: {}", e))
}

fn get_validator(kind: DatasetKind) -> Result<&'static jsonschema::Validator, String> {
    let (cell, source) = match kind {
        DatasetKind::Golden => (&GOLDEN_VALIDATOR, GOLDEN_SCHEMA_JSON),
        DatasetKind::Rules => (&RULES_VALIDATOR, RULES_SCHEMA_JSON),
        DatasetKind::Judge => (&JUDGE_VALIDATOR, JUDGE_SCHEMA_JSON),
    };

    cell.get_or_init(|| compile(source)).as_ref().map_err(Clone::clone)
}

/// Validate one row against the schema for `kind`.
///
/// Returns every violation as `"<message> at <instance path>"`.
pub fn validate_row(kind: DatasetKind, row: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator(kind).map_err(|e| vec![e])?;

    let errors: Vec<String> = validator
        .iter_errors(row)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
