use crate::server::{
    Result, ServerError, ServerRouter,
    json::{Created, Json},
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use quill_common::model::{
    post::{PostId, PostView},
    request::{CreatePostRequest, UpdatePostRequest},
};
use quill_db::PostStore;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

type Store = Arc<dyn PostStore>;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_posts)
        .typed_post(create_post)
        .typed_get(get_post)
        .typed_put(update_post)
        .typed_delete(delete_post)
}

#[derive(TypedPath)]
#[typed_path("/posts")]
struct PostsPath;

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
struct PostPath {
    id: PostId,
}

/// Delete takes the raw segment: an id that cannot name a post is already gone.
#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
struct DeletePostPath {
    id: String,
}

async fn list_posts(_: PostsPath, State(store): State<Store>) -> Result<Json<Vec<PostView>>> {
    let posts = store.list_posts().await?;

    Ok(Json(posts.iter().map(PostView::from).collect()))
}

async fn get_post(PostPath { id }: PostPath, State(store): State<Store>) -> Result<Json<PostView>> {
    let post = store
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(PostView::from(post)))
}

async fn create_post(
    _: PostsPath,
    State(store): State<Store>,
    Json(request): Json<CreatePostRequest>,
) -> Result<Created<PostView>> {
    let post = request.validate()?;
    let post = store.create_post(&post).await?;

    Ok(Created(PostView::from(post)))
}

async fn update_post(
    PostPath { id }: PostPath,
    State(store): State<Store>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<StatusCode> {
    let update = request.validate(id)?;
    store
        .update_post(id, &update)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_post(
    DeletePostPath { id }: DeletePostPath,
    State(store): State<Store>,
) -> Result<StatusCode> {
    match id.parse::<PostId>() {
        Ok(id) => {
            store.delete_post(id).await?;
        }
        Err(error) => debug!(%error, "Ignoring delete of malformed post id"),
    }

    Ok(StatusCode::NO_CONTENT)
}
