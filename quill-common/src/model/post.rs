use crate::model::{Id, text::NonEmptyText};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

pub type PostId = Id<PostMarker>;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub first_name: NonEmptyText,
    pub last_name: NonEmptyText,
}

impl Author {
    /// `"<firstName> <lastName>"`, the form clients see.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Post {
    pub id: PostId,
    pub title: NonEmptyText,
    pub content: NonEmptyText,
    pub author: Author,
    pub created: OffsetDateTime,
}

impl Post {
    /// Overwrites the fields present in `update`; everything else stays.
    pub fn apply(&mut self, update: &UpdatePost) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(content) = &update.content {
            self.content = content.clone();
        }
        if let Some(author) = &update.author {
            self.author = author.clone();
        }
    }
}

/// What clients get back for a post.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct PostView {
    pub id: PostId,
    pub title: String,
    pub author: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
}

impl From<&Post> for PostView {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            title: post.title.get().to_owned(),
            author: post.author.display_name(),
            content: post.content.get().to_owned(),
            created: post.created,
        }
    }
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self::from(&post)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreatePost {
    pub title: NonEmptyText,
    pub content: NonEmptyText,
    pub author: Author,
}

impl CreatePost {
    #[must_use]
    pub fn into_post(self, id: PostId, created: OffsetDateTime) -> Post {
        Post {
            id,
            title: self.title,
            content: self.content,
            author: self.author,
            created,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct UpdatePost {
    pub title: Option<NonEmptyText>,
    pub content: Option<NonEmptyText>,
    pub author: Option<Author>,
}
