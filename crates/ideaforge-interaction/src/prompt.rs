//! Prompt rendering for extraction requests.

use ideaforge_core::extraction::{ExtractionError, ExtractionRequest};
use minijinja::{Environment, context};

const PROMPT_TEMPLATE_NAME: &str = "extraction_prompt";

const PROMPT_TEMPLATE: &str = r#"You are a startup coach helping a founder shape a business idea.
The founder is on the "{{ page_context }}" page of their workspace.

Reply conversationally in the `response` field. When the founder's message
states or changes any of the following, also fill the matching field:
- businessConcept: one sentence describing the business
- targetMarket: who the business serves
- keyFeatures: product capabilities, one short phrase each
- nextSteps: concrete actions the founder should take next
Leave a field out when the message says nothing about it.

Founder's message:
{{ prompt_text }}"#;

/// Default system instruction sent with every request.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "Answer only with a JSON object that matches the provided response schema.";

/// Renders the user-facing prompt from an [`ExtractionRequest`].
pub struct ExtractionPrompt {
    env: Environment<'static>,
}

impl ExtractionPrompt {
    pub fn new() -> Result<Self, ExtractionError> {
        let mut env = Environment::new();
        env.add_template(PROMPT_TEMPLATE_NAME, PROMPT_TEMPLATE)
            .map_err(|e| ExtractionError::Config(format!("Invalid prompt template: {e}")))?;
        Ok(Self { env })
    }

    pub fn render(&self, request: &ExtractionRequest) -> Result<String, ExtractionError> {
        let template = self
            .env
            .get_template(PROMPT_TEMPLATE_NAME)
            .map_err(|e| ExtractionError::Config(e.to_string()))?;

        template
            .render(context! {
                page_context => request.page_context,
                prompt_text => request.prompt_text,
            })
            .map_err(|e| ExtractionError::Config(format!("Failed to render prompt: {e}")))
    }
}

impl std::fmt::Debug for ExtractionPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionPrompt").finish_non_exhaustive()
    }
}
