//! Prompt types.

use serde::{Deserialize, Serialize};

/// Template override loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplates {
    /// Unique template identifier
    pub id: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Handlebars template for the system instruction.
    /// Variables: `language`.
    pub system: String,

    /// Handlebars template for the user prompt.
    /// Variables: `query`, `context` (empty when nothing matched),
    /// `noSchemeMarker`, `relatedHeading`, `language`.
    pub user: String,
}

/// A fully composed prompt ready for the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedPrompt {
    #[serde(rename = "systemInstruction")]
    pub system_instruction: String,

    #[serde(rename = "userPrompt")]
    pub user_prompt: String,

    pub metadata: ComposedPromptMetadata,
}

/// Metadata about a composed prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedPromptMetadata {
    /// Template used ("builtin" unless a workspace override applied)
    #[serde(rename = "templateId")]
    pub template_id: String,

    /// Number of scheme blocks embedded in the user prompt
    #[serde(rename = "schemesIncluded")]
    pub schemes_included: usize,
}

impl ComposedPrompt {
    /// Whether the prompt carries retrieved schemes.
    pub fn is_grounded(&self) -> bool {
        self.metadata.schemes_included > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_deserialization() {
        let yaml = r#"
id: answer
apiVersion: "1.0"
system: "Reply only in {{language}}."
user: "{{query}}"
"#;
        let templates: PromptTemplates = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(templates.id, "answer");
        assert_eq!(templates.system, "Reply only in {{language}}.");
    }

    #[test]
    fn test_is_grounded() {
        let prompt = ComposedPrompt {
            system_instruction: String::new(),
            user_prompt: String::new(),
            metadata: ComposedPromptMetadata {
                template_id: "builtin".to_string(),
                schemes_included: 0,
            },
        };
        assert!(!prompt.is_grounded());
    }
}
