//! Prompt composer: grounds a question in retrieved schemes.

use crate::types::{ComposedPrompt, ComposedPromptMetadata, PromptTemplates};
use handlebars::Handlebars;
use sanchar_core::{AppError, AppResult, SchemeRecord};

/// Written in place of the scheme blocks when nothing matched.
pub const NO_SCHEME_MARKER: &str = "No specific scheme found.";

/// Heading placed above the scheme blocks.
pub const RELATED_SCHEMES_HEADING: &str = "Related Schemes:";

const BUILTIN_TEMPLATE_ID: &str = "builtin";

const SAMPLE_QUERY: &str = "<<sample-query>>";
const SAMPLE_CONTEXT: &str = "<<sample-context>>";

/// Builds the system instruction and user prompt for one question.
///
/// The output language is fixed per composer; every prompt it produces
/// instructs the generator to answer only in that language.
pub struct PromptComposer {
    language: String,
    template_override: Option<TemplateOverride>,
}

struct TemplateOverride {
    id: String,
    registry: Handlebars<'static>,
}

impl PromptComposer {
    /// Composer using the built-in wording.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            template_override: None,
        }
    }

    /// Composer using workspace templates.
    ///
    /// The templates are trial-rendered here. The user prompt must restate
    /// the query first, then carry the context (or [`NO_SCHEME_MARKER`] when
    /// nothing matched), and name the output language after that section.
    pub fn with_templates(
        language: impl Into<String>,
        templates: PromptTemplates,
    ) -> AppResult<Self> {
        let mut registry = Handlebars::new();

        // Plain text, not HTML
        registry.register_escape_fn(handlebars::no_escape);

        registry
            .register_template_string("system", &templates.system)
            .map_err(|e| AppError::Prompt(format!("Failed to register system template: {}", e)))?;
        registry
            .register_template_string("user", &templates.user)
            .map_err(|e| AppError::Prompt(format!("Failed to register user template: {}", e)))?;

        let composer = Self {
            language: language.into(),
            template_override: Some(TemplateOverride {
                id: templates.id,
                registry,
            }),
        };
        composer.check_override()?;

        Ok(composer)
    }

    /// Target output language.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Compose the prompt for `query` grounded in `records`.
    pub fn compose(&self, query: &str, records: &[SchemeRecord]) -> ComposedPrompt {
        let context = render_context(records);

        if let Some(ref template) = self.template_override {
            match self.render_override(template, query, context.as_deref()) {
                Ok((system_instruction, user_prompt)) => {
                    return ComposedPrompt {
                        system_instruction,
                        user_prompt,
                        metadata: ComposedPromptMetadata {
                            template_id: template.id.clone(),
                            schemes_included: records.len(),
                        },
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        template = %template.id,
                        "Template override failed to render, using built-in wording: {}",
                        e
                    );
                }
            }
        }

        ComposedPrompt {
            system_instruction: builtin_system_instruction(&self.language),
            user_prompt: builtin_user_prompt(query, context.as_deref(), &self.language),
            metadata: ComposedPromptMetadata {
                template_id: BUILTIN_TEMPLATE_ID.to_string(),
                schemes_included: records.len(),
            },
        }
    }

    fn render_override(
        &self,
        template: &TemplateOverride,
        query: &str,
        context: Option<&str>,
    ) -> Result<(String, String), handlebars::RenderError> {
        let data = serde_json::json!({
            "query": query,
            "context": context.unwrap_or_default(),
            "language": self.language,
            "noSchemeMarker": NO_SCHEME_MARKER,
            "relatedHeading": RELATED_SCHEMES_HEADING,
        });

        let system = template.registry.render("system", &data)?;
        let user = template.registry.render("user", &data)?;
        Ok((system, user))
    }

    fn check_override(&self) -> AppResult<()> {
        let Some(ref template) = self.template_override else {
            return Ok(());
        };

        let render = |context| {
            self.render_override(template, SAMPLE_QUERY, context)
                .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
        };

        let (system, grounded) = render(Some(SAMPLE_CONTEXT))?;
        let (_, fallback) = render(None)?;

        if !system.contains(&self.language) {
            return Err(AppError::Prompt(format!(
                "Template '{}' system instruction must name the output language",
                template.id
            )));
        }

        let (Some(grounded_query), Some(fallback_query)) =
            (grounded.find(SAMPLE_QUERY), fallback.find(SAMPLE_QUERY))
        else {
            return Err(AppError::Prompt(format!(
                "Template '{}' must restate {{{{query}}}} in the user prompt",
                template.id
            )));
        };

        let Some(context_at) = grounded.find(SAMPLE_CONTEXT) else {
            return Err(AppError::Prompt(format!(
                "Template '{}' must embed {{{{context}}}} when schemes match",
                template.id
            )));
        };

        let Some(marker_at) = fallback.find(NO_SCHEME_MARKER) else {
            return Err(AppError::Prompt(format!(
                "Template '{}' must emit {{{{noSchemeMarker}}}} when no scheme matches",
                template.id
            )));
        };

        if grounded_query > context_at || fallback_query > marker_at {
            return Err(AppError::Prompt(format!(
                "Template '{}' must restate {{{{query}}}} before the scheme context",
                template.id
            )));
        }

        let grounded_tail = &grounded[context_at + SAMPLE_CONTEXT.len()..];
        let fallback_tail = &fallback[marker_at + NO_SCHEME_MARKER.len()..];
        if !grounded_tail.contains(&self.language) || !fallback_tail.contains(&self.language) {
            return Err(AppError::Prompt(format!(
                "Template '{}' must end the user prompt with a {{{{language}}}} directive",
                template.id
            )));
        }

        Ok(())
    }
}

/// Render one scheme as a labelled block.
pub fn render_scheme_block(record: &SchemeRecord) -> String {
    format!(
        "Scheme: {}\nCategory: {}\nEligibility: {}\nBenefits: {}\nHow to Apply: {}",
        record.name, record.category, record.eligibility, record.benefits, record.how_to_apply
    )
}

fn render_context(records: &[SchemeRecord]) -> Option<String> {
    if records.is_empty() {
        return None;
    }

    Some(
        records
            .iter()
            .map(render_scheme_block)
            .collect::<Vec<_>>()
            .join("\n\n"),
    )
}

fn builtin_system_instruction(language: &str) -> String {
    format!(
        "You are Bharat Sanchar AI, an assistant providing information about Indian \
         government welfare schemes in {language}. Answer the user's question clearly and \
         simply in {language}, whatever language the question is written in. Use the \
         provided context if available."
    )
}

fn builtin_user_prompt(query: &str, context: Option<&str>, language: &str) -> String {
    let section = match context {
        Some(context) => format!("{}\n{}", RELATED_SCHEMES_HEADING, context),
        None => NO_SCHEME_MARKER.to_string(),
    };

    format!(
        "Question: {}\n\n{}\n\nPlease answer this question in {}.",
        query, section, language
    )
}
