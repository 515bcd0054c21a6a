//! Project loading, validation, and introspection.

use std::path::Path;

use gb_core::FieldKind;
use gb_project::schema::Project;

use crate::error::{AppError, AppResult};

/// One sampled column, for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSummary {
    pub column: String,
    pub field: FieldKind,
    pub device_id: String,
    pub device_type: String,
}

/// Load a project from a YAML file.
pub fn load_project(path: &Path) -> AppResult<Project> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::ProjectFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let project = gb_project::parse_yaml(&content)?;
    tracing::debug!(path = %path.display(), name = %project.name, "project loaded");
    Ok(project)
}

/// Validate project structure.
pub fn validate_project(project: &Project) -> AppResult<()> {
    gb_project::validate_project(project)?;
    Ok(())
}

/// List every configured field with the device it is read from.
pub fn list_fields(project: &Project) -> Vec<FieldSummary> {
    project
        .fields
        .iter()
        .map(|field| FieldSummary {
            column: field.column().to_string(),
            field: field.field,
            device_id: field.device.clone(),
            device_type: project
                .device(&field.device)
                .map(|d| d.kind.type_name().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
        .collect()
}
