use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: u64,
    pub term: String,
    pub definition: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashcardSide {
    Term,
    Definition,
}

/// Partial update to a card; `None` leaves a side unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlashcardUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl FlashcardUpdate {
    pub fn side(side: FlashcardSide, text: impl Into<String>) -> Self {
        match side {
            FlashcardSide::Term => Self {
                term: Some(text.into()),
                definition: None,
            },
            FlashcardSide::Definition => Self {
                term: None,
                definition: Some(text.into()),
            },
        }
    }

    /// Parse a generated `Term: ... Definition: ...` answer
    pub fn parse_generated(text: &str) -> Option<Self> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(r"(?s)Term:\s*(.*?)\s*Definition:\s*(.*)").expect("Invalid flashcard regex")
        });

        let captures = pattern.captures(text)?;
        Some(Self {
            term: Some(captures[1].trim().to_string()),
            definition: Some(captures[2].trim().to_string()),
        })
    }

    pub fn apply(&self, card: &mut Flashcard) {
        if let Some(term) = &self.term {
            card.term = term.clone();
        }
        if let Some(definition) = &self.definition {
            card.definition = definition.clone();
        }
    }
}

impl Flashcard {
    /// The side a prediction should fill, if exactly one side is empty
    pub fn missing_side(&self) -> Option<FlashcardSide> {
        match (self.term.is_empty(), self.definition.is_empty()) {
            (true, false) => Some(FlashcardSide::Term),
            (false, true) => Some(FlashcardSide::Definition),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_parse_generated_term_and_definition() {
        let update =
            FlashcardUpdate::parse_generated("Term: Mitochondria\nDefinition: The powerhouse\nof the cell.\n")
                .unwrap();

        assert_eq!(update.term.as_deref(), Some("Mitochondria"));
        assert_eq!(update.definition.as_deref(), Some("The powerhouse\nof the cell."));
    }

    #[test]
    fn test_parse_generated_without_shape() {
        assert_eq!(FlashcardUpdate::parse_generated("Just an answer"), None);
    }

    #[rstest]
    #[case("", "def", Some(FlashcardSide::Term))]
    #[case("term", "", Some(FlashcardSide::Definition))]
    #[case("", "", None)]
    #[case("term", "def", None)]
    fn test_missing_side(
        #[case] term: &str,
        #[case] definition: &str,
        #[case] expected: Option<FlashcardSide>,
    ) {
        let card = Flashcard {
            id: 1,
            term: term.to_string(),
            definition: definition.to_string(),
        };
        assert_eq!(card.missing_side(), expected);
    }

    #[test]
    fn test_apply_only_touches_given_side() {
        let mut card = Flashcard {
            id: 7,
            term: "Cell".to_string(),
            definition: String::new(),
        };

        FlashcardUpdate::side(FlashcardSide::Definition, "Smallest unit of life").apply(&mut card);

        assert_eq!(card.term, "Cell");
        assert_eq!(card.definition, "Smallest unit of life");
    }
}
