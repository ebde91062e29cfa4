//! Shared harness for the HTTP tests: an in-process router over a
//! `MemoryStore`.
#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use quill_api::server::{self, ServerState};
use quill_common::model::{
    post::{Author, CreatePost, Post},
    text::NonEmptyText,
};
use quill_db::{MemoryStore, PostStore};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

pub fn text(s: &str) -> NonEmptyText {
    NonEmptyText::try_from(s).unwrap()
}

pub fn generate_post(n: usize) -> CreatePost {
    CreatePost {
        title: text(&format!("Post number {n}")),
        content: text(&format!("Lorem ipsum dolor sit amet, paragraph {n}.")),
        author: Author {
            first_name: text(&format!("First{n}")),
            last_name: text(&format!("Last{n}")),
        },
    }
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let router = server::app(ServerState::new(Arc::clone(&store) as Arc<dyn PostStore>));
        Self { router, store }
    }

    /// Fresh app with `count` seeded posts.
    pub async fn seeded(count: usize) -> (Self, Vec<Post>) {
        let app = Self::new();
        let seeded = app
            .store
            .insert_posts(&(1..=count).map(generate_post).collect::<Vec<_>>())
            .await
            .unwrap();
        (app, seeded)
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&body).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    pub async fn send_json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = self.send(method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}
