use quill_common::model::{
    ModelValidationError,
    post::{Author, Post},
    text::NonEmptyText,
};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PostRecord {
    pub post_snowflake: i64,
    pub title: String,
    pub content: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub created: OffsetDateTime,
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.post_snowflake.cast_unsigned().into(),
            title: NonEmptyText::new(value.title)?,
            content: NonEmptyText::new(value.content)?,
            author: Author {
                first_name: NonEmptyText::new(value.author_first_name)?,
                last_name: NonEmptyText::new(value.author_last_name)?,
            },
            created: value.created,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::record::PostRecord;
    use quill_common::model::{ModelValidationError, post::Post, text::EmptyTextError};
    use time::macros::datetime;

    fn record() -> PostRecord {
        PostRecord {
            post_snowflake: -1,
            title: "A".to_owned(),
            content: "B".to_owned(),
            author_first_name: "X".to_owned(),
            author_last_name: "Y".to_owned(),
            created: datetime!(2025-03-03 03:03 UTC),
        }
    }

    #[test]
    fn converts_valid_row() {
        let post = Post::try_from(record()).unwrap();

        assert_eq!(u64::from(post.id), u64::MAX);
        assert_eq!(post.author.display_name(), "X Y");
        assert_eq!(post.created, datetime!(2025-03-03 03:03 UTC));
    }

    #[test]
    fn rejects_row_with_empty_field() {
        let row = PostRecord {
            author_last_name: String::new(),
            ..record()
        };

        assert_eq!(
            Post::try_from(row),
            Err(ModelValidationError::EmptyText(EmptyTextError))
        );
    }
}
