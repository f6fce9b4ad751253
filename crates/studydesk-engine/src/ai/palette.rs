use crate::ai::client::{AiContext, Keyword};

/// What picking a suggestion does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionAction {
    Run(Keyword),
    /// Keep the palette open with the search term prefilled
    Prompt(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub context: AiContext,
    pub category: &'static str,
    pub name: &'static str,
    pub action: SuggestionAction,
}

/// Prefill used when a flashcard needs a topic before generating
pub const CREATE_FLASHCARD_PROMPT: &str = "Create flashcard for ";

static SUGGESTIONS: [Suggestion; 4] = [
    Suggestion {
        context: AiContext::Notes,
        category: "",
        name: "Continue writing",
        action: SuggestionAction::Run(Keyword::Continue),
    },
    Suggestion {
        context: AiContext::Notes,
        category: "Generate from material",
        name: "Summarize",
        action: SuggestionAction::Run(Keyword::Summarize),
    },
    Suggestion {
        context: AiContext::Notes,
        category: "Edit or review",
        name: "Improve writing",
        action: SuggestionAction::Run(Keyword::Improve),
    },
    Suggestion {
        context: AiContext::Flashcards,
        category: "Create with AI",
        name: "Create flashcard",
        action: SuggestionAction::Prompt(CREATE_FLASHCARD_PROMPT),
    },
];

pub fn suggestions() -> &'static [Suggestion] {
    &SUGGESTIONS
}

/// Suggestions for `context` whose name contains `term`, ignoring case
pub fn filter_suggestions(context: AiContext, term: &str) -> Vec<&'static Suggestion> {
    let term = term.to_lowercase();
    SUGGESTIONS
        .iter()
        .filter(|suggestion| {
            suggestion.context == context && suggestion.name.to_lowercase().contains(&term)
        })
        .collect()
}

/// The command palette's open/closed state and search input
#[derive(Debug, Clone)]
pub struct Palette {
    context: AiContext,
    visible: bool,
    search_term: String,
    selected: usize,
}

impl Palette {
    pub fn new(context: AiContext) -> Self {
        Self {
            context,
            visible: false,
            search_term: String::new(),
            selected: 0,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Space pressed outside the palette. Opens it when the target is blank.
    pub fn on_space(&mut self, target_is_empty: bool) -> bool {
        if target_is_empty && !self.visible {
            self.visible = true;
            self.selected = 0;
        }
        self.visible
    }

    pub fn type_char(&mut self, ch: char) {
        if !self.visible || (self.search_term.is_empty() && ch == ' ') {
            return;
        }
        self.search_term.push(ch);
        self.selected = 0;
    }

    /// Delete one character; on an empty term this closes the palette
    pub fn backspace(&mut self) {
        if self.search_term.pop().is_none() {
            self.close();
        }
        self.selected = 0;
    }

    pub fn filtered(&self) -> Vec<&'static Suggestion> {
        filter_suggestions(self.context, &self.search_term)
    }

    pub fn select_next(&mut self) {
        let count = self.filtered().len();
        if count > 0 {
            self.selected = (self.selected + 1) % count;
        }
    }

    pub fn select_previous(&mut self) {
        let count = self.filtered().len();
        if count > 0 {
            self.selected = (self.selected + count - 1) % count;
        }
    }

    pub fn close(&mut self) {
        self.visible = false;
        self.search_term.clear();
        self.selected = 0;
    }

    /// Pick the highlighted suggestion
    ///
    /// Runnable suggestions close the palette and return their keyword. Prompt
    /// suggestions prefill the search term and return `None`.
    pub fn choose(&mut self) -> Option<Keyword> {
        let suggestion = self.filtered().get(self.selected).copied()?;
        match &suggestion.action {
            SuggestionAction::Run(keyword) => {
                self.close();
                Some(keyword.clone())
            }
            SuggestionAction::Prompt(prefill) => {
                self.search_term = prefill.to_string();
                self.visible = true;
                None
            }
        }
    }

    /// Submit the typed text as a free-form request
    pub fn submit(&mut self) -> Option<Keyword> {
        let term = self.search_term.trim().to_string();
        self.close();
        (!term.is_empty()).then(|| Keyword::parse(&term))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(AiContext::Notes, "", 3)]
    #[case(AiContext::Notes, "SUM", 1)]
    #[case(AiContext::Notes, "writing", 2)]
    #[case(AiContext::Notes, "flashcard", 0)]
    #[case(AiContext::Flashcards, "", 1)]
    fn test_filter_suggestions(
        #[case] context: AiContext,
        #[case] term: &str,
        #[case] expected: usize,
    ) {
        assert_eq!(filter_suggestions(context, term).len(), expected);
    }

    #[test]
    fn test_space_opens_only_on_empty_target() {
        let mut palette = Palette::new(AiContext::Notes);

        assert!(!palette.on_space(false));
        assert!(palette.on_space(true));
        assert!(palette.is_visible());
    }

    #[test]
    fn test_leading_space_is_not_typed() {
        let mut palette = Palette::new(AiContext::Notes);
        palette.on_space(true);

        palette.type_char(' ');
        palette.type_char('a');
        palette.type_char(' ');

        assert_eq!(palette.search_term(), "a ");
    }

    #[test]
    fn test_backspace_on_empty_term_closes() {
        let mut palette = Palette::new(AiContext::Notes);
        palette.on_space(true);
        palette.type_char('x');

        palette.backspace();
        assert!(palette.is_visible());
        palette.backspace();
        assert!(!palette.is_visible());
    }

    #[test]
    fn test_choose_runs_highlighted_suggestion_and_closes() {
        let mut palette = Palette::new(AiContext::Notes);
        palette.on_space(true);
        palette.select_next();

        assert_eq!(palette.choose(), Some(Keyword::Summarize));
        assert!(!palette.is_visible());
    }

    #[test]
    fn test_select_previous_wraps() {
        let mut palette = Palette::new(AiContext::Notes);
        palette.on_space(true);
        palette.select_previous();
        assert_eq!(palette.selected(), 2);
    }

    #[test]
    fn test_prompt_suggestion_prefills_term() {
        let mut palette = Palette::new(AiContext::Flashcards);
        palette.on_space(true);

        assert_eq!(palette.choose(), None);
        assert_eq!(palette.search_term(), CREATE_FLASHCARD_PROMPT);
        assert!(palette.is_visible());
    }

    #[test]
    fn test_submit_sends_free_text_as_custom() {
        let mut palette = Palette::new(AiContext::Notes);
        palette.on_space(true);
        for ch in "quiz me".chars() {
            palette.type_char(ch);
        }

        assert_eq!(palette.submit(), Some(Keyword::Custom("quiz me".to_string())));
        assert!(!palette.is_visible());
        assert_eq!(palette.search_term(), "");
    }
}
