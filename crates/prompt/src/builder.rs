//! Template rendering for stage input messages.

use concierge_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Input message templates used by the router stages.
///
/// Each template renders the single extra user message a stage sends in
/// addition to the conversation so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageTemplate {
    /// Sent to the rewrite agent
    OriginalQuestion,

    /// Sent to the classify agent
    RewrittenQuestion,
}

impl StageTemplate {
    /// Handlebars source of the template.
    pub fn source(&self) -> &'static str {
        match self {
            StageTemplate::OriginalQuestion => "Original question: {{question}}",
            StageTemplate::RewrittenQuestion => "Question: {{question}}",
        }
    }

    /// Render the template for a question.
    ///
    /// # Example
    /// ```
    /// use concierge_prompt::StageTemplate;
    ///
    /// let text = StageTemplate::RewrittenQuestion.render("What changed?").unwrap();
    /// assert_eq!(text, "Question: What changed?");
    /// ```
    pub fn render(&self, question: &str) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        render_template(self.source(), &variables)
    }
}

/// Render a Handlebars template with variables.
///
/// HTML escaping is disabled: the output is plain text sent to the model.
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Hello, world!".to_string());

        let result = render_template("Question: {{question}}", &vars);
        assert_eq!(result.unwrap(), "Question: Hello, world!");
    }

    #[test]
    fn test_original_question_keeps_markup() {
        let text = StageTemplate::OriginalQuestion
            .render("粗利額 <上位5件> & 顧客名")
            .unwrap();
        assert_eq!(text, "Original question: 粗利額 <上位5件> & 顧客名");
    }

    #[test]
    fn test_empty_question_passes_through() {
        let text = StageTemplate::RewrittenQuestion.render("   ").unwrap();
        assert_eq!(text, "Question:    ");
    }

    #[test]
    fn test_render_template_missing_variable() {
        let vars = HashMap::new();
        // Handlebars renders missing variables as empty string
        let result = render_template("Question: {{missing}}", &vars);
        assert_eq!(result.unwrap(), "Question: ");
    }

    #[test]
    fn test_render_invalid_template() {
        let vars = HashMap::new();
        assert!(render_template("{{#if}}", &vars).is_err());
    }
}
