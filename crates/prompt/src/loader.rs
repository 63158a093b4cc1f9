//! Loader for workspace prompt template overrides.

use crate::types::PromptTemplates;
use sanchar_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Template id the answer pipeline looks for.
pub const DEFAULT_TEMPLATE_ID: &str = "answer";

/// Path of the override file for a template id.
pub fn templates_path(workspace_path: &Path, template_id: &str) -> PathBuf {
    workspace_path
        .join(".sanchar/prompts")
        .join(format!("{}.yml", template_id))
}

/// Load a template override by id, if the workspace provides one.
///
/// Returns `Ok(None)` when `.sanchar/prompts/<id>.yml` does not exist and an
/// error when it exists but cannot be read, parsed or validated.
///
/// # Example
/// ```no_run
/// use sanchar_prompt::{find_templates, DEFAULT_TEMPLATE_ID};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// if let Some(templates) = find_templates(Path::new("."), DEFAULT_TEMPLATE_ID)? {
///     println!("Using template override: {}", templates.id);
/// }
/// # Ok(())
/// # }
/// ```
pub fn find_templates(
    workspace_path: &Path,
    template_id: &str,
) -> AppResult<Option<PromptTemplates>> {
    let template_file = templates_path(workspace_path, template_id);

    if !template_file.exists() {
        tracing::debug!("No template override at {:?}", template_file);
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&template_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read template file {:?}: {}",
            template_file, e
        ))
    })?;

    let templates: PromptTemplates = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse template YAML {:?}: {}",
            template_file, e
        ))
    })?;

    validate_templates(&templates)?;

    tracing::info!("Loaded prompt template override: {}", templates.id);

    Ok(Some(templates))
}

fn validate_templates(def: &PromptTemplates) -> AppResult<()> {
    if def.id.trim().is_empty() {
        return Err(AppError::Prompt("Template id cannot be empty".to_string()));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    if def.system.trim().is_empty() || def.user.trim().is_empty() {
        return Err(AppError::Prompt(
            "Both system and user templates are required".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_templates(dir: &Path, id: &str, body: &str) {
        let path = templates_path(dir, id);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn test_missing_override_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let result = find_templates(temp_dir.path(), DEFAULT_TEMPLATE_ID).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_load_valid_override() {
        let temp_dir = TempDir::new().unwrap();
        write_templates(
            temp_dir.path(),
            "answer",
            r#"
id: answer
apiVersion: "1.0"
system: "Reply only in {{language}}."
user: "Question: {{query}}"
"#,
        );

        let templates = find_templates(temp_dir.path(), "answer").unwrap().unwrap();
        assert_eq!(templates.id, "answer");
        assert_eq!(templates.user, "Question: {{query}}");
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let temp_dir = TempDir::new().unwrap();
        write_templates(temp_dir.path(), "answer", "invalid: yaml: content:");

        assert!(find_templates(temp_dir.path(), "answer").is_err());
    }

    #[test]
    fn test_bad_api_version_is_error() {
        let temp_dir = TempDir::new().unwrap();
        write_templates(
            temp_dir.path(),
            "answer",
            "id: answer\napiVersion: \"1\"\nsystem: s\nuser: u\n",
        );

        let err = find_templates(temp_dir.path(), "answer").unwrap_err();
        assert!(err.to_string().contains("apiVersion"));
    }
}
