use serde::{Deserialize, Serialize};
use std::fmt;

/// Prompting technique appended to a pattern's system prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    ChainOfThought,
    TreeOfThought,
    SelfConsistency,
    ReAct,
    ExpertPersona,
    StructuredOutput,
    Socratic,
}

impl Strategy {
    pub const ALL: [Strategy; 7] = [
        Strategy::ChainOfThought,
        Strategy::TreeOfThought,
        Strategy::SelfConsistency,
        Strategy::ReAct,
        Strategy::ExpertPersona,
        Strategy::StructuredOutput,
        Strategy::Socratic,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Strategy::ChainOfThought => "Chain of Thought (CoT)",
            Strategy::TreeOfThought => "Tree of Thought (ToT)",
            Strategy::SelfConsistency => "Self-Consistency",
            Strategy::ReAct => "ReAct",
            Strategy::ExpertPersona => "Expert Persona",
            Strategy::StructuredOutput => "Structured Output",
            Strategy::Socratic => "Socratic Method",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Strategy::ChainOfThought => "Think step-by-step before answering",
            Strategy::TreeOfThought => "Explore multiple reasoning paths",
            Strategy::SelfConsistency => "Generate multiple answers and pick the most common",
            Strategy::ReAct => "Interleave reasoning with actions",
            Strategy::ExpertPersona => "Respond as a domain expert",
            Strategy::StructuredOutput => "Format the response with clear sections",
            Strategy::Socratic => "Consider clarifying questions first",
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            Strategy::ChainOfThought => {
                "Let's think through this step by step, then provide the final answer."
            }
            Strategy::TreeOfThought => {
                "Consider multiple approaches, briefly evaluate each, then select the best solution."
            }
            Strategy::SelfConsistency => {
                "Generate several independent answers, then determine the most consistent response."
            }
            Strategy::ReAct => {
                "Think about what to do, take an action, observe the result, and repeat until done."
            }
            Strategy::ExpertPersona => {
                "You are a world-class expert in this domain. Provide authoritative, detailed insights."
            }
            Strategy::StructuredOutput => {
                "Organize your response with clear headings, bullet points, and structured sections."
            }
            Strategy::Socratic => {
                "Before answering, consider what clarifying questions would help. Then provide a thorough response."
            }
        }
    }

    /// `system` followed by a `STRATEGY:` section.
    pub fn apply(&self, system: &str) -> String {
        format!("{system}\n\n---\nSTRATEGY: {}", self.prompt())
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_a_strategy_section() {
        assert_eq!(
            Strategy::ChainOfThought.apply("# IDENTITY"),
            "# IDENTITY\n\n---\nSTRATEGY: Let's think through this step by step, then provide the final answer."
        );
    }

    #[test]
    fn serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&Strategy::ExpertPersona).unwrap(),
            "\"expert-persona\""
        );
        let parsed: Strategy = serde_json::from_str("\"re-act\"").unwrap();
        assert_eq!(parsed, Strategy::ReAct);
    }

    #[test]
    fn every_strategy_has_a_prompt() {
        for strategy in Strategy::ALL {
            assert!(!strategy.prompt().is_empty(), "{strategy}");
            assert!(!strategy.description().is_empty(), "{strategy}");
        }
    }
}
