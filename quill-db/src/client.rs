use crate::{
    record::PostRecord,
    store::{PostStore, Result, next_post_id},
};
use async_trait::async_trait;
use quill_common::{
    model::{
        QuillSnowflakeGenerator,
        post::{CreatePost, Post, PostId, UpdatePost},
        text::NonEmptyText,
    },
    snowflake::NodeId,
};
use sqlx::{PgExecutor, PgPool, postgres::PgPoolOptions, query, query_as};
use std::sync::Mutex;
use time::OffsetDateTime;
use tracing::{debug, info};

const CREATE_POSTS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS posts (
        post_snowflake BIGINT PRIMARY KEY,
        title TEXT NOT NULL CHECK (btrim(title) <> ''),
        content TEXT NOT NULL CHECK (btrim(content) <> ''),
        author_first_name TEXT NOT NULL CHECK (btrim(author_first_name) <> ''),
        author_last_name TEXT NOT NULL CHECK (btrim(author_last_name) <> ''),
        created TIMESTAMPTZ NOT NULL DEFAULT now()
    )
";

const POST_COLUMNS: &str =
    "post_snowflake, title, content, author_first_name, author_last_name, created";

/// Post storage in Postgres.
pub struct DbClient {
    pool: PgPool,
    snowflake_generator: Mutex<QuillSnowflakeGenerator>,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool, node_id: NodeId) -> Self {
        let snowflake_generator = Mutex::new(QuillSnowflakeGenerator::new(node_id));

        Self {
            pool,
            snowflake_generator,
        }
    }

    /// Opens a pool for `database_url` and makes sure the `posts` table exists.
    pub async fn connect(database_url: &str, node_id: NodeId) -> Result<Self> {
        let pool = PgPoolOptions::new().connect(database_url).await?;
        let client = Self::new(pool, node_id);
        client.ensure_schema().await?;

        info!("Connected to post database");
        Ok(client)
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        query(CREATE_POSTS_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Removes every stored post. Returns how many rows went away.
    pub async fn delete_all_posts(&self) -> Result<u64> {
        let deleted = query("DELETE FROM posts")
            .execute(&self.pool)
            .await?
            .rows_affected();

        debug!(deleted, "Cleared posts table");
        Ok(deleted)
    }

    async fn insert_post<'e>(
        &self,
        executor: impl PgExecutor<'e>,
        post: &CreatePost,
    ) -> Result<Post> {
        let post_id = next_post_id(&self.snowflake_generator)?;

        let record = query_as::<_, PostRecord>(&format!(
            "
            INSERT INTO posts (post_snowflake, title, content, author_first_name, author_last_name, created)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {POST_COLUMNS}
            "
        ))
        .bind(u64::from(post_id).cast_signed())
        .bind(post.title.get())
        .bind(post.content.get())
        .bind(post.author.first_name.get())
        .bind(post.author.last_name.get())
        .bind(OffsetDateTime::now_utc())
        .fetch_one(executor)
        .await?;

        Ok(Post::try_from(record)?)
    }
}

#[async_trait]
impl PostStore for DbClient {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        let records = query_as::<_, PostRecord>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created, post_snowflake"
        ))
        .fetch_all(&self.pool)
        .await?;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?;
        Ok(posts)
    }

    async fn fetch_post(&self, id: PostId) -> Result<Option<Post>> {
        let record = query_as::<_, PostRecord>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE post_snowflake = $1"
        ))
        .bind(u64::from(id).cast_signed())
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    async fn create_post(&self, post: &CreatePost) -> Result<Post> {
        let post = self.insert_post(&self.pool, post).await?;

        debug!(id = %post.id, "Created post");
        Ok(post)
    }

    async fn insert_posts(&self, posts: &[CreatePost]) -> Result<Vec<Post>> {
        let mut transaction = self.pool.begin().await?;

        let mut inserted = Vec::with_capacity(posts.len());
        for post in posts {
            inserted.push(self.insert_post(&mut *transaction, post).await?);
        }
        transaction.commit().await?;

        debug!(count = inserted.len(), "Inserted posts");
        Ok(inserted)
    }

    async fn update_post(&self, id: PostId, update: &UpdatePost) -> Result<Option<Post>> {
        let author = update.author.as_ref();

        let record = query_as::<_, PostRecord>(&format!(
            "
            UPDATE posts SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                author_first_name = COALESCE($4, author_first_name),
                author_last_name = COALESCE($5, author_last_name)
            WHERE post_snowflake = $1
            RETURNING {POST_COLUMNS}
            "
        ))
        .bind(u64::from(id).cast_signed())
        .bind(update.title.as_ref().map(NonEmptyText::get))
        .bind(update.content.as_ref().map(NonEmptyText::get))
        .bind(author.map(|author| author.first_name.get()))
        .bind(author.map(|author| author.last_name.get()))
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        if post.is_some() {
            debug!(%id, "Updated post");
        }
        Ok(post)
    }

    async fn delete_post(&self, id: PostId) -> Result<bool> {
        let result = query("DELETE FROM posts WHERE post_snowflake = $1")
            .bind(u64::from(id).cast_signed())
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        debug!(%id, deleted, "Deleted post");
        Ok(deleted)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Closed post database");
    }
}
