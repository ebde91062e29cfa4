use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// A string holding at least one non-whitespace character.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct NonEmptyText(String);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Text must not be empty")]
pub struct EmptyTextError;

impl NonEmptyText {
    pub fn new(text: String) -> Result<Self, EmptyTextError> {
        if text.trim().is_empty() {
            Err(EmptyTextError)
        } else {
            Ok(Self(text))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Display for NonEmptyText {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NonEmptyText {
    type Error = EmptyTextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for NonEmptyText {
    type Error = EmptyTextError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_owned())
    }
}

impl<'de> Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        if inner.trim().is_empty() {
            return Err(Error::invalid_value(
                Unexpected::Str(&inner),
                &"a non-empty string",
            ));
        }
        Ok(Self(inner))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::text::{EmptyTextError, NonEmptyText};

    #[test]
    fn rejects_blank_text() {
        assert_eq!(NonEmptyText::new(String::new()), Err(EmptyTextError));
        assert_eq!(NonEmptyText::try_from(" \t\n"), Err(EmptyTextError));
        assert_eq!(NonEmptyText::try_from(" a ").unwrap().get(), " a ");
    }

    #[test]
    fn deserialize_validates() {
        assert!(serde_json::from_str::<NonEmptyText>(r#""""#).is_err());
        assert_eq!(
            serde_json::from_str::<NonEmptyText>(r#""hello""#).unwrap(),
            NonEmptyText::try_from("hello").unwrap()
        );
    }
}
