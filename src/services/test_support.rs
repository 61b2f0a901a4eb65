//! Tag repositories that misbehave on purpose, wrapped around a `MemoryStore`.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sea_orm::DbErr;

use crate::db::models::Tag;
use crate::db::repositories::{MemoryStore, RepositoryError, TagRepository};

/// Fails every lookup after the first `healthy_lookups` with a database error.
pub(crate) struct FlakyTags {
    pub(crate) inner: MemoryStore,
    healthy_lookups: usize,
    lookups: AtomicUsize,
}

impl FlakyTags {
    pub(crate) fn new(inner: MemoryStore, healthy_lookups: usize) -> Self {
        Self {
            inner,
            healthy_lookups,
            lookups: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TagRepository for FlakyTags {
    async fn create(&self, name: &str) -> Result<Tag, RepositoryError> {
        TagRepository::create(&self.inner, name).await
    }
    async fn find_by_id(&self, id: i32) -> Result<Tag, RepositoryError> {
        TagRepository::find_by_id(&self.inner, id).await
    }
    async fn find_by_name(&self, name: &str) -> Result<Tag, RepositoryError> {
        if self.lookups.fetch_add(1, Ordering::SeqCst) >= self.healthy_lookups {
            return Err(RepositoryError::Database(DbErr::Custom("connection lost".into())));
        }
        TagRepository::find_by_name(&self.inner, name).await
    }
    async fn find_all(&self) -> Result<Vec<Tag>, RepositoryError> {
        TagRepository::find_all(&self.inner).await
    }
    async fn update(&self, tag: Tag) -> Result<Tag, RepositoryError> {
        TagRepository::update(&self.inner, tag).await
    }
    async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        TagRepository::delete(&self.inner, id).await
    }
}

/// Misses the first lookup even when the tag exists, as a request does when
/// another one inserts the same name between its lookup and its insert.
pub(crate) struct StaleFirstLookup {
    pub(crate) inner: MemoryStore,
    lookups: AtomicUsize,
}

impl StaleFirstLookup {
    pub(crate) fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
        }
    }

    pub(crate) fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TagRepository for StaleFirstLookup {
    async fn create(&self, name: &str) -> Result<Tag, RepositoryError> {
        TagRepository::create(&self.inner, name).await
    }
    async fn find_by_id(&self, id: i32) -> Result<Tag, RepositoryError> {
        TagRepository::find_by_id(&self.inner, id).await
    }
    async fn find_by_name(&self, name: &str) -> Result<Tag, RepositoryError> {
        if self.lookups.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(RepositoryError::NotFound(format!("Tag '{name}'")));
        }
        TagRepository::find_by_name(&self.inner, name).await
    }
    async fn find_all(&self) -> Result<Vec<Tag>, RepositoryError> {
        TagRepository::find_all(&self.inner).await
    }
    async fn update(&self, tag: Tag) -> Result<Tag, RepositoryError> {
        TagRepository::update(&self.inner, tag).await
    }
    async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        TagRepository::delete(&self.inner, id).await
    }
}
