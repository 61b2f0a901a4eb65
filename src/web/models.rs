use serde::Deserialize;

use crate::web::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTodoRequest {
    pub title: String,
    pub completed: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub name: String,
}

fn require_non_blank(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("'{field}' must not be empty")));
    }
    Ok(())
}

fn validate_tag_names(tags: &[String]) -> Result<(), AppError> {
    tags.iter().try_for_each(|name| require_non_blank("tags", name))
}

impl CreateTodoRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_non_blank("title", &self.title)?;
        validate_tag_names(&self.tags)
    }
}

impl UpdateTodoRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_tag_names(&self.tags)
    }
}

impl TagRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_non_blank("name", &self.name)
    }
}
