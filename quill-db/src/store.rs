use async_trait::async_trait;
use quill_common::{
    model::{
        ModelValidationError, QuillSnowflakeGenerator,
        post::{CreatePost, Post, PostId, UpdatePost},
    },
    snowflake::SnowflakeError,
};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("Could not generate an id: {0}")]
    Snowflake(#[from] SnowflakeError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Storage for the post collection.
///
/// Handlers only ever see this trait; which backend sits behind it is decided
/// at startup.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Every stored post, in the backend's natural order.
    async fn list_posts(&self) -> Result<Vec<Post>>;

    async fn fetch_post(&self, id: PostId) -> Result<Option<Post>>;

    /// Assigns id and creation time, persists, and returns the stored post.
    async fn create_post(&self, post: &CreatePost) -> Result<Post>;

    /// Bulk variant of [`PostStore::create_post`]. All or nothing where the
    /// backend supports it.
    async fn insert_posts(&self, posts: &[CreatePost]) -> Result<Vec<Post>>;

    /// `None` if there is no post with this id.
    async fn update_post(&self, id: PostId, update: &UpdatePost) -> Result<Option<Post>>;

    /// Returns whether a post was removed. A missing id is not an error.
    async fn delete_post(&self, id: PostId) -> Result<bool>;

    async fn close(&self);
}

pub(crate) fn next_post_id(generator: &Mutex<QuillSnowflakeGenerator>) -> Result<PostId> {
    let snowflake = generator
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .generate()?;

    Ok(snowflake.into())
}
