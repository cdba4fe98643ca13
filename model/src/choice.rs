//! Support for reading XSD choice groups ("exactly one of the following").
//!
//! In the model every choice group is an enum, so a populated value always
//! has exactly one alternative. The sources that choice groups are read from
//! are less strict: an XML container may hold no child or several children,
//! and a caller assembling a value from optional parts may fill in more than
//! one. [`Alternatives`] collects the candidates and only yields a value when
//! there is exactly one.

use crate::error::Error;

/// Candidates for one choice group, in the order they were offered.
#[derive(Debug)]
pub struct Alternatives<T> {
    path: String,
    populated: Vec<(String, T)>,
}

impl<T> Alternatives<T> {
    /// Creates an empty set of candidates for the choice group at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            populated: Vec::new(),
        }
    }

    /// Adds a candidate named by its tag.
    pub fn push(&mut self, tag: impl Into<String>, value: T) -> &mut Self {
        self.populated.push((tag.into(), value));
        self
    }

    /// Adds a candidate if `value` is populated. An absent value is not a
    /// candidate.
    pub fn offer(&mut self, tag: impl Into<String>, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.push(tag, value);
        }
        self
    }

    /// Returns the tags of the candidates offered so far.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.populated.iter().map(|(tag, _)| tag.as_str())
    }

    /// Returns the only candidate, or [`Error::InvalidChoice`] when there
    /// are none or several.
    pub fn single(mut self) -> Result<T, Error> {
        if self.populated.len() == 1 {
            if let Some((_, value)) = self.populated.pop() {
                return Ok(value);
            }
        }
        Err(Error::InvalidChoice {
            found: self.populated.into_iter().map(|(tag, _)| tag).collect(),
            path: self.path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    #[test]
    fn single_when_one_alternative_then_returns_it() {
        let mut choice = Alternatives::new("dataType[T]/baseType");
        choice.offer("BOOL", Some(DataType::Bool));
        choice.offer("INT", None);

        assert_eq!(choice.single().unwrap(), DataType::Bool);
    }

    #[test]
    fn single_when_bool_and_int_then_invalid_choice() {
        let mut choice = Alternatives::new("dataType[T]/baseType");
        choice
            .offer("BOOL", Some(DataType::Bool))
            .offer("INT", Some(DataType::Int));

        let err = choice.single().unwrap_err();
        assert_eq!(
            err,
            Error::InvalidChoice {
                path: "dataType[T]/baseType".to_string(),
                found: vec!["BOOL".to_string(), "INT".to_string()],
            }
        );
    }

    #[test]
    fn single_when_nothing_offered_then_invalid_choice() {
        let choice: Alternatives<DataType> = Alternatives::new("variable[x]/type");

        let err = choice.single().unwrap_err();
        assert!(matches!(err, Error::InvalidChoice { found, .. } if found.is_empty()));
    }

    #[test]
    fn tags_when_pushed_then_in_offer_order() {
        let mut choice = Alternatives::new("body");
        choice.push("ST", 1).push("FBD", 2);

        assert_eq!(choice.tags().collect::<Vec<_>>(), vec!["ST", "FBD"]);
    }
}
