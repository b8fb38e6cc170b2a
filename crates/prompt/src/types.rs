//! Prompt types for Concierge.

use serde::{Deserialize, Serialize};

/// An instruction override loaded from YAML.
///
/// Stored as `.concierge/prompts/<id>.yml`; `id` names the agent whose
/// built-in instructions are replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Agent identifier (e.g., "classify")
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Replacement instructions
    pub instructions: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: classify
title: Classify estimate questions
apiVersion: "1.0"
createdBy: sales-ops
instructions: |
  -- 見積データに関する質問は必ず q-and-a へ
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "classify");
        assert_eq!(def.created_by, "sales-ops");
        assert!(def.instructions.contains("q-and-a"));
    }

    #[test]
    fn test_created_by_defaults_to_empty() {
        let yaml = "id: rewrite\ntitle: R\napiVersion: \"1.0\"\ninstructions: x\n";
        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.created_by, "");
    }
}
