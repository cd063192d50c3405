use std::path::Path;

use thiserror::Error;

/// A resource file name split along the `<category>-<identifier>.<ext>` convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceName {
    pub category: String,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceNameError {
    #[error("resource file name must not be empty")]
    Empty,
    #[error("resource file name '{name}' has no '-' separating category and identifier")]
    MissingSeparator { name: String },
    #[error("resource file name '{name}' has an empty category")]
    EmptyCategory { name: String },
    #[error("resource file name '{name}' has an empty identifier")]
    EmptyIdentifier { name: String },
}

/// Splits on the first `-` of the file stem; the extension, if any, is dropped.
pub fn parse_resource_name(file_name: &str) -> Result<ResourceName, ResourceNameError> {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    if stem.is_empty() {
        return Err(ResourceNameError::Empty);
    }

    let Some((category, identifier)) = stem.split_once('-') else {
        return Err(ResourceNameError::MissingSeparator {
            name: file_name.to_string(),
        });
    };
    if category.is_empty() {
        return Err(ResourceNameError::EmptyCategory {
            name: file_name.to_string(),
        });
    }
    if identifier.is_empty() {
        return Err(ResourceNameError::EmptyIdentifier {
            name: file_name.to_string(),
        });
    }

    Ok(ResourceName {
        category: category.to_string(),
        identifier: identifier.to_string(),
    })
}
