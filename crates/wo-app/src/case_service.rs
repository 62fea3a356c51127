//! Case loading and saving.

use std::path::Path;

use crate::error::{AppError, AppResult};
use crate::schema::Case;
use crate::validate::validate_case;

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Load and validate a case from a YAML or JSON file (by extension).
pub fn load_case(path: &Path) -> AppResult<Case> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::CaseFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let case: Case = if is_json(path) {
        serde_json::from_str(&content)
            .map_err(|e| AppError::Parse(format!("Failed to parse case JSON: {e}")))?
    } else {
        serde_yaml::from_str(&content)
            .map_err(|e| AppError::Parse(format!("Failed to parse case YAML: {e}")))?
    };
    validate_case(&case)?;
    Ok(case)
}

/// Save a validated case as YAML or JSON (by extension).
pub fn save_case(path: &Path, case: &Case) -> AppResult<()> {
    validate_case(case)?;
    let content = if is_json(path) {
        serde_json::to_string_pretty(case)
            .map_err(|e| AppError::Parse(format!("Failed to serialize case: {e}")))?
    } else {
        serde_yaml::to_string(case)
            .map_err(|e| AppError::Parse(format!("Failed to serialize case: {e}")))?
    };

    std::fs::write(path, content).map_err(|e| AppError::CaseFileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}
