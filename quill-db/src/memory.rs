//! In-process post storage. Data is lost when the process exits.

use crate::store::{PostStore, Result, next_post_id};
use async_trait::async_trait;
use quill_common::{
    model::{
        QuillSnowflakeGenerator,
        post::{CreatePost, Post, PostId, UpdatePost},
    },
    snowflake::NodeId,
};
use std::{collections::BTreeMap, sync::Mutex};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::debug;

/// Posts keyed by id. Ids grow monotonically, so iteration order is creation
/// order.
pub struct MemoryStore {
    posts: RwLock<BTreeMap<PostId, Post>>,
    snowflake_generator: Mutex<QuillSnowflakeGenerator>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(node_id: NodeId) -> Self {
        Self {
            posts: RwLock::new(BTreeMap::new()),
            snowflake_generator: Mutex::new(QuillSnowflakeGenerator::new(node_id)),
        }
    }

    pub async fn len(&self) -> usize {
        self.posts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.posts.read().await.is_empty()
    }

    fn build_post(&self, post: &CreatePost) -> Result<Post> {
        let id = next_post_id(&self.snowflake_generator)?;
        Ok(post.clone().into_post(id, OffsetDateTime::now_utc()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(NodeId::default())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        Ok(self.posts.read().await.values().cloned().collect())
    }

    async fn fetch_post(&self, id: PostId) -> Result<Option<Post>> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn create_post(&self, post: &CreatePost) -> Result<Post> {
        let post = self.build_post(post)?;
        self.posts.write().await.insert(post.id, post.clone());

        debug!(id = %post.id, "Created post");
        Ok(post)
    }

    async fn insert_posts(&self, posts: &[CreatePost]) -> Result<Vec<Post>> {
        let inserted = posts
            .iter()
            .map(|post| self.build_post(post))
            .collect::<Result<Vec<_>>>()?;

        let mut stored = self.posts.write().await;
        for post in &inserted {
            stored.insert(post.id, post.clone());
        }

        debug!(count = inserted.len(), "Inserted posts");
        Ok(inserted)
    }

    async fn update_post(&self, id: PostId, update: &UpdatePost) -> Result<Option<Post>> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.get_mut(&id) else {
            return Ok(None);
        };
        post.apply(update);

        debug!(%id, "Updated post");
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: PostId) -> Result<bool> {
        let deleted = self.posts.write().await.remove(&id).is_some();

        debug!(%id, deleted, "Deleted post");
        Ok(deleted)
    }

    async fn close(&self) {
        self.posts.write().await.clear();
    }
}
