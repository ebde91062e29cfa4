//! Loosely typed request bodies and their validation into model types.
//!
//! Every field is optional on the wire so that a missing field can be
//! reported by name instead of as a generic deserialization failure.

use crate::model::{
    post::{Author, CreatePost, PostId, UpdatePost},
    text::NonEmptyText,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ValidationError {
    #[error("Missing `{0}` in request body")]
    MissingField(&'static str),
    #[error("`{0}` must not be empty")]
    EmptyField(&'static str),
    #[error("Request path id ({path}) and request body id ({body}) must match")]
    IdMismatch { path: PostId, body: PostId },
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<AuthorRequest>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct UpdatePostRequest {
    pub id: Option<PostId>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<AuthorRequest>,
}

fn non_empty(value: String, field: &'static str) -> Result<NonEmptyText, ValidationError> {
    NonEmptyText::new(value).map_err(|_| ValidationError::EmptyField(field))
}

fn required(value: Option<String>, field: &'static str) -> Result<NonEmptyText, ValidationError> {
    non_empty(value.ok_or(ValidationError::MissingField(field))?, field)
}

fn optional(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<NonEmptyText>, ValidationError> {
    value.map(|value| non_empty(value, field)).transpose()
}

impl AuthorRequest {
    pub fn validate(self) -> Result<Author, ValidationError> {
        Ok(Author {
            first_name: required(self.first_name, "author.firstName")?,
            last_name: required(self.last_name, "author.lastName")?,
        })
    }
}

impl CreatePostRequest {
    /// Fields are checked in wire order; the first problem wins.
    pub fn validate(self) -> Result<CreatePost, ValidationError> {
        let title = required(self.title, "title")?;
        let content = required(self.content, "content")?;
        let author = self
            .author
            .ok_or(ValidationError::MissingField("author"))?
            .validate()?;

        Ok(CreatePost {
            title,
            content,
            author,
        })
    }
}

impl UpdatePostRequest {
    /// The path id is authoritative; a body id is optional but must agree.
    pub fn validate(self, path_id: PostId) -> Result<UpdatePost, ValidationError> {
        if let Some(body_id) = self.id
            && body_id != path_id
        {
            return Err(ValidationError::IdMismatch {
                path: path_id,
                body: body_id,
            });
        }

        Ok(UpdatePost {
            title: optional(self.title, "title")?,
            content: optional(self.content, "content")?,
            author: self.author.map(AuthorRequest::validate).transpose()?,
        })
    }
}
