//! Common types used across CLI modules

/// Pipeline reference: a numeric id or a pipeline tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineRef {
    Id(i64),
    Tag(String),
}

impl PipelineRef {
    /// Parse a string into a PipelineRef
    ///
    /// Anything that parses as an integer is an id; everything else is a tag.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        match input.parse::<i64>() {
            Ok(id) => PipelineRef::Id(id),
            Err(_) => PipelineRef::Tag(input.to_string()),
        }
    }
}

impl std::fmt::Display for PipelineRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineRef::Id(id) => write!(f, "{}", id),
            PipelineRef::Tag(tag) => write!(f, "{}", tag),
        }
    }
}

impl From<&str> for PipelineRef {
    fn from(s: &str) -> Self {
        PipelineRef::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_input_is_id() {
        assert_eq!(PipelineRef::parse("42"), PipelineRef::Id(42));
        assert_eq!(PipelineRef::parse(" 7 "), PipelineRef::Id(7));
    }

    #[test]
    fn test_other_input_is_tag() {
        assert_eq!(
            PipelineRef::parse("orders_v1"),
            PipelineRef::Tag("orders_v1".to_string())
        );
        assert_eq!(PipelineRef::from("42a").to_string(), "42a");
    }
}
