//! Static agent registry.
//!
//! Five definitions are built once at startup and shared read-only across
//! runs. Instructions may be replaced by workspace overrides at build time;
//! nothing changes afterwards.

use crate::config::RouterConfig;
use crate::types::Specialist;
use concierge_llm::responses::{CodeContainer, UserLocation};
use concierge_llm::{HostedTool, OutputSchema, Reasoning, ReasoningEffort};
use std::collections::HashMap;
use std::fmt;

const REWRITE_INSTRUCTIONS: &str = "\
-- ユーザの質問を具体的かつデータに関連したかたちで書き換える。
-- 情報が不足して特定できない場合は、ユーザーに確認せず前提条件を設定し、回答する旨を追加する。また採用した前提条件も明記するよう指示する。
-- 回答を記述する場合は、表や箇条書きを使うなどして分かりやすく表記するよう指示をする。";

const CLASSIFY_INSTRUCTIONS: &str = "\
-- 見積データに関する質問は必ず Q&A（Internal Q&A）へ
-- operating_procedure には、社内の見積データで答えられる質問なら \"q-and-a\"、外部情報の調査が必要なら \"fact-finding\" を設定する。";

const INTERNAL_QA_INSTRUCTIONS: &str = "\
-- Est_vector storeの中のestimate_data.jsonには、これまでに作成された見積の情報が入っている。
-- 特に指定が無い場合、estimate_data.jsonの{} で囲まれた１つのオブジェクトを、１つの見積の情報として認識する。
-- 回答前に必ず File search で関連情報を探す。
-- 必要に応じて見つかった根拠（見積番号/顧客名/案件名/日付/金額など）を回答に含める
-- 数値の「合計・平均・件数」などの厳密集計は、根拠に含まれる範囲を明示し、曖昧なら「集計条件」を確認する";

const FACT_FINDING_INSTRUCTIONS: &str = "\
Explore external information using the tools you have (web search, file search, code interpreter).
Analyze any relevant data, checking your work.

Make sure to output a concise answer followed by summarized bullet point of supporting evidence";

const GENERAL_INSTRUCTIONS: &str = "Ask the user to provide more detail so you can help them by either answering their question or running data analysis relevant to their query";

/// Identifier of a registered agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentId {
    Rewrite,
    Classify,
    InternalQa,
    ExternalFactFinding,
    General,
}

impl AgentId {
    pub const ALL: [AgentId; 5] = [
        AgentId::Rewrite,
        AgentId::Classify,
        AgentId::InternalQa,
        AgentId::ExternalFactFinding,
        AgentId::General,
    ];

    /// Stable id, also the instruction override file stem.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::Rewrite => "rewrite",
            AgentId::Classify => "classify",
            AgentId::InternalQa => "internal_q_a",
            AgentId::ExternalFactFinding => "external_fact_finding",
            AgentId::General => "general",
        }
    }

    pub fn for_specialist(specialist: Specialist) -> Self {
        match specialist {
            Specialist::InternalQa => AgentId::InternalQa,
            Specialist::FactFinding => AgentId::ExternalFactFinding,
            Specialist::General => AgentId::General,
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model behavior settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub store: bool,
    pub reasoning: Reasoning,
}

impl ModelSettings {
    fn with_effort(effort: ReasoningEffort) -> Self {
        Self {
            store: true,
            reasoning: Reasoning {
                effort,
                summary: Some("auto".to_string()),
            },
        }
    }
}

/// Immutable agent configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentDefinition {
    pub id: AgentId,

    /// Display name
    pub name: String,

    pub instructions: String,

    pub model: String,

    /// Schema the final output must conform to; free text when absent
    pub output_schema: Option<OutputSchema>,

    pub tools: Vec<HostedTool>,

    pub settings: ModelSettings,
}

/// Schema of the classify agent's output.
pub fn classify_schema() -> OutputSchema {
    OutputSchema {
        name: "ClassifySchema".to_string(),
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "operating_procedure": { "type": "string" }
            },
            "required": ["operating_procedure"],
            "additionalProperties": false
        }),
        strict: true,
    }
}

/// The five router agents.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: HashMap<AgentId, AgentDefinition>,
}

impl AgentRegistry {
    /// Build the registry, applying instruction overrides keyed by agent id.
    pub fn new(config: &RouterConfig, overrides: &HashMap<String, String>) -> Self {
        let instructions = |id: AgentId, default: &str| {
            match overrides.get(id.as_str()) {
                Some(text) => {
                    tracing::info!(agent = %id, "Using instruction override");
                    text.clone()
                }
                None => default.to_string(),
            }
        };

        let definition = |id: AgentId,
                          name: &str,
                          default: &str,
                          output_schema: Option<OutputSchema>,
                          tools: Vec<HostedTool>,
                          effort: ReasoningEffort| AgentDefinition {
            id,
            name: name.to_string(),
            instructions: instructions(id, default),
            model: config.model.clone(),
            output_schema,
            tools,
            settings: ModelSettings::with_effort(effort),
        };

        for id in overrides.keys() {
            if !AgentId::ALL.iter().any(|agent| agent.as_str() == id) {
                tracing::warn!(id = %id, "Ignoring instruction override for unknown agent");
            }
        }

        let agents = [
            definition(
                AgentId::Rewrite,
                "Query rewrite",
                REWRITE_INSTRUCTIONS,
                None,
                Vec::new(),
                ReasoningEffort::Low,
            ),
            definition(
                AgentId::Classify,
                "Classify",
                CLASSIFY_INSTRUCTIONS,
                Some(classify_schema()),
                Vec::new(),
                ReasoningEffort::Low,
            ),
            definition(
                AgentId::InternalQa,
                "Internal Q&A",
                INTERNAL_QA_INSTRUCTIONS,
                None,
                vec![HostedTool::FileSearch {
                    vector_store_ids: config.vector_store_ids.clone(),
                }],
                ReasoningEffort::Low,
            ),
            definition(
                AgentId::ExternalFactFinding,
                "External fact finding",
                FACT_FINDING_INSTRUCTIONS,
                None,
                vec![
                    HostedTool::WebSearchPreview {
                        search_context_size: "medium".to_string(),
                        user_location: UserLocation::approximate(),
                    },
                    HostedTool::CodeInterpreter {
                        container: CodeContainer::auto(),
                    },
                ],
                ReasoningEffort::Low,
            ),
            definition(
                AgentId::General,
                "General",
                GENERAL_INSTRUCTIONS,
                None,
                Vec::new(),
                ReasoningEffort::Medium,
            ),
        ];

        Self {
            agents: agents.into_iter().map(|agent| (agent.id, agent)).collect(),
        }
    }

    pub fn get(&self, id: AgentId) -> &AgentDefinition {
        // Every id is inserted in `new`
        &self.agents[&id]
    }

    pub fn specialist(&self, specialist: Specialist) -> &AgentDefinition {
        self.get(AgentId::for_specialist(specialist))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> RouterConfig {
        RouterConfig {
            model: "gpt-5".to_string(),
            workflow_id: "wf_test".to_string(),
            trace_name: "Est_agent".to_string(),
            vector_store_ids: vec!["vs_estimates".to_string()],
            stage_timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_registry_shapes() {
        let registry = AgentRegistry::new(&config(), &HashMap::new());

        let rewrite = registry.get(AgentId::Rewrite);
        assert!(rewrite.tools.is_empty());
        assert!(rewrite.output_schema.is_none());

        let classify = registry.get(AgentId::Classify);
        assert!(classify.tools.is_empty());
        assert_eq!(
            classify.output_schema.as_ref().map(|s| s.name.as_str()),
            Some("ClassifySchema")
        );

        let internal = registry.specialist(Specialist::InternalQa);
        assert_eq!(
            internal.tools,
            vec![HostedTool::FileSearch {
                vector_store_ids: vec!["vs_estimates".to_string()]
            }]
        );

        let external = registry.specialist(Specialist::FactFinding);
        let names: Vec<_> = external.tools.iter().map(HostedTool::name).collect();
        assert_eq!(names, vec!["web_search_preview", "code_interpreter"]);

        let general = registry.specialist(Specialist::General);
        assert!(general.tools.is_empty());
        assert_eq!(general.settings.reasoning.effort, ReasoningEffort::Medium);
        assert_eq!(rewrite.settings.reasoning.effort, ReasoningEffort::Low);
    }

    #[test]
    fn test_all_agents_use_configured_model() {
        let registry = AgentRegistry::new(&config(), &HashMap::new());
        for id in AgentId::ALL {
            let agent = registry.get(id);
            assert_eq!(agent.model, "gpt-5");
            assert!(agent.settings.store);
            assert_eq!(agent.settings.reasoning.summary.as_deref(), Some("auto"));
        }
    }

    #[test]
    fn test_instruction_override() {
        let mut overrides = HashMap::new();
        overrides.insert("classify".to_string(), "custom routing".to_string());
        let registry = AgentRegistry::new(&config(), &overrides);
        assert_eq!(registry.get(AgentId::Classify).instructions, "custom routing");
        assert_eq!(
            registry.get(AgentId::Rewrite).instructions,
            REWRITE_INSTRUCTIONS
        );
    }

    #[test]
    fn test_classify_schema_requires_field() {
        let schema = classify_schema();
        assert!(schema.strict);
        assert_eq!(schema.schema["required"][0], "operating_procedure");
        assert_eq!(schema.schema["additionalProperties"], false);
    }
}
