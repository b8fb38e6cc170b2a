//! Domain types for the query router.

use concierge_llm::responses::{item_type, message_text, reasoning_summary, user_input};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// One role-tagged unit of conversational content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,

    pub content: String,

    /// Remote output item this turn was produced from, replayed verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Value>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            item: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            item: None,
        }
    }

    /// Convert a remote output item into a turn.
    ///
    /// Messages and reasoning become assistant turns; hosted tool calls
    /// (file search, web search, code interpreter) become tool turns.
    pub fn from_output_item(item: Value) -> Self {
        let kind = item_type(&item).to_string();
        let (role, content) = match kind.as_str() {
            "message" => (Role::Assistant, message_text(&item)),
            "reasoning" => (Role::Assistant, reasoning_summary(&item)),
            _ => {
                let status = item.get("status").and_then(Value::as_str).unwrap_or("unknown");
                (Role::Tool, format!("{} ({})", kind, status))
            }
        };
        Self {
            role,
            content,
            item: Some(item),
        }
    }

    /// Input item sent back to the remote service.
    pub fn to_input_item(&self) -> Value {
        if let Some(ref item) = self.item {
            return item.clone();
        }
        match self.role {
            Role::User => user_input(self.content.clone()),
            Role::Assistant | Role::Tool => serde_json::json!({
                "role": "assistant",
                "content": self.content,
            }),
        }
    }
}

/// Ordered, append-only conversation history.
///
/// Stages take the conversation by value and hand back the extended one, so
/// the flow of turns through a run is explicit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Start a conversation with the user's question.
    pub fn seeded(question: &str) -> Self {
        Self {
            turns: vec![Turn::user(question)],
        }
    }

    /// Append turns in order, returning the extended conversation.
    #[must_use]
    pub fn extended(mut self, turns: impl IntoIterator<Item = Turn>) -> Self {
        self.turns.extend(turns);
        self
    }

    /// The turns so far followed by one extra, unrecorded turn.
    pub fn with_pending(&self, pending: Turn) -> Vec<Turn> {
        let mut turns = self.turns.clone();
        turns.push(pending);
        turns
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// The classification label selecting a specialist.
///
/// Matching is exact: a label that differs only in casing is `Unrecognized`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatingProcedure {
    QAndA,
    FactFinding,
    Unrecognized(String),
}

impl OperatingProcedure {
    pub fn parse(label: &str) -> Self {
        match label {
            "q-and-a" => OperatingProcedure::QAndA,
            "fact-finding" => OperatingProcedure::FactFinding,
            other => OperatingProcedure::Unrecognized(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            OperatingProcedure::QAndA => "q-and-a",
            OperatingProcedure::FactFinding => "fact-finding",
            OperatingProcedure::Unrecognized(label) => label,
        }
    }

    /// The specialist this procedure dispatches to.
    pub fn specialist(&self) -> Specialist {
        match self {
            OperatingProcedure::QAndA => Specialist::InternalQa,
            OperatingProcedure::FactFinding => Specialist::FactFinding,
            OperatingProcedure::Unrecognized(_) => Specialist::General,
        }
    }
}

/// Structured output of the classify agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifySchema {
    pub operating_procedure: String,
}

/// One of the three mutually exclusive terminal agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialist {
    InternalQa,
    FactFinding,
    General,
}

impl Specialist {
    /// Header label printed above the answer.
    pub fn header(&self) -> &'static str {
        match self {
            Specialist::InternalQa => "Internal Q&A",
            Specialist::FactFinding => "Fact Finding",
            Specialist::General => "General",
        }
    }
}

/// Which pipeline step a remote call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Rewrite,
    Classify,
    Dispatch(Specialist),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Rewrite => f.write_str("rewrite"),
            Stage::Classify => f.write_str("classify"),
            Stage::Dispatch(Specialist::InternalQa) => f.write_str("internal_q_a"),
            Stage::Dispatch(Specialist::FactFinding) => f.write_str("external_fact_finding"),
            Stage::Dispatch(Specialist::General) => f.write_str("general"),
        }
    }
}

/// The single question a run answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInput {
    pub input_as_text: String,
}

impl WorkflowInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            input_as_text: text.into(),
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Specialist that produced the answer
    pub specialist: Specialist,

    /// Label the classify stage returned
    pub procedure: OperatingProcedure,

    /// Output of the rewrite stage
    pub rewritten_question: String,

    /// Final answer text
    pub answer: String,

    /// Full history at the end of the run
    pub conversation: Conversation,
}

impl RunResult {
    /// Header line identifying the producing branch.
    pub fn header_line(&self) -> String {
        format!("===== AGENT ANSWER ({}) =====", self.specialist.header())
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\n{}\n{}", self.header_line(), self.answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_label_matching() {
        assert_eq!(OperatingProcedure::parse("q-and-a"), OperatingProcedure::QAndA);
        assert_eq!(
            OperatingProcedure::parse("fact-finding"),
            OperatingProcedure::FactFinding
        );
        assert_eq!(
            OperatingProcedure::parse("Q-and-A"),
            OperatingProcedure::Unrecognized("Q-and-A".to_string())
        );
        assert_eq!(
            OperatingProcedure::parse(""),
            OperatingProcedure::Unrecognized(String::new())
        );
        assert_eq!(
            OperatingProcedure::parse(" q-and-a").specialist(),
            Specialist::General
        );
    }

    #[test]
    fn test_procedure_to_specialist() {
        assert_eq!(OperatingProcedure::QAndA.specialist(), Specialist::InternalQa);
        assert_eq!(
            OperatingProcedure::FactFinding.specialist(),
            Specialist::FactFinding
        );
        assert_eq!(
            OperatingProcedure::parse("unknown").specialist(),
            Specialist::General
        );
    }

    #[test]
    fn test_conversation_is_threaded() {
        let conversation = Conversation::seeded("question");
        let pending = conversation.with_pending(Turn::user("Original question: question"));
        assert_eq!(pending.len(), 2);
        assert_eq!(conversation.len(), 1);

        let conversation = conversation.extended(vec![Turn::assistant("a"), Turn::assistant("b")]);
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.turns()[0].content, "question");
        assert_eq!(conversation.turns()[2].content, "b");
    }

    #[test]
    fn test_turn_from_output_items() {
        let message = Turn::from_output_item(serde_json::json!({
            "type": "message",
            "role": "assistant",
            "content": [{"type": "output_text", "text": "回答"}]
        }));
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.content, "回答");

        let call = Turn::from_output_item(serde_json::json!({
            "type": "web_search_call",
            "id": "ws_1",
            "status": "completed"
        }));
        assert_eq!(call.role, Role::Tool);
        assert_eq!(call.content, "web_search_call (completed)");
        assert_eq!(call.to_input_item()["id"], "ws_1");
    }

    #[test]
    fn test_user_turn_input_item() {
        let item = Turn::user("昨年の見積").to_input_item();
        assert_eq!(item["role"], "user");
        assert_eq!(item["content"][0]["type"], "input_text");
        assert_eq!(item["content"][0]["text"], "昨年の見積");
    }

    #[test]
    fn test_run_result_display() {
        let result = RunResult {
            specialist: Specialist::InternalQa,
            procedure: OperatingProcedure::QAndA,
            rewritten_question: "rewritten".to_string(),
            answer: "top five".to_string(),
            conversation: Conversation::default(),
        };
        assert_eq!(
            result.to_string(),
            "\n===== AGENT ANSWER (Internal Q&A) =====\ntop five"
        );
    }
}
