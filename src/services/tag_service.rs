use std::sync::Arc;

use tracing::{debug, info};

use crate::db::models::Tag;
use crate::db::repositories::{RepositoryError, TagRepository};

#[derive(Clone)]
pub struct TagService {
    repo: Arc<dyn TagRepository>,
}

impl TagService {
    pub fn new(repo: Arc<dyn TagRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_tag(&self, name: &str) -> Result<Tag, RepositoryError> {
        let tag = self.repo.create(name).await?;
        info!(tag_id = tag.id, name = %tag.name, "Created tag.");
        Ok(tag)
    }

    pub async fn get_tag(&self, id: i32) -> Result<Tag, RepositoryError> {
        self.repo.find_by_id(id).await
    }

    pub async fn get_tag_by_name(&self, name: &str) -> Result<Tag, RepositoryError> {
        self.repo.find_by_name(name).await
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>, RepositoryError> {
        self.repo.find_all().await
    }

    pub async fn update_tag(&self, tag: Tag) -> Result<Tag, RepositoryError> {
        self.repo.update(tag).await
    }

    pub async fn delete_tag(&self, id: i32) -> Result<(), RepositoryError> {
        self.repo.delete(id).await
    }

    /// Resolves tag names to tags, creating the ones that do not exist yet.
    ///
    /// The result follows the order of `names`, one entry per input name, so
    /// repeated names yield the same tag more than once. A lookup failure
    /// other than `NotFound` aborts the whole call.
    pub async fn get_or_create_tags(
        &self,
        names: &[String],
    ) -> Result<Vec<Tag>, RepositoryError> {
        let mut tags = Vec::with_capacity(names.len());
        for name in names {
            let tag = match self.get_tag_by_name(name).await {
                Ok(tag) => {
                    debug!(tag_id = tag.id, name = %name, "Reusing existing tag.");
                    tag
                }
                Err(RepositoryError::NotFound(_)) => match self.create_tag(name).await {
                    Ok(tag) => tag,
                    // Lost the insert to a concurrent request; its row is there now.
                    Err(RepositoryError::Conflict(_)) => {
                        debug!(name = %name, "Tag created concurrently, looking it up again.");
                        self.get_tag_by_name(name).await?
                    }
                    Err(e) => return Err(e),
                },
                Err(e) => return Err(e),
            };
            tags.push(tag);
        }
        Ok(tags)
    }
}
