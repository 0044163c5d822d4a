pub mod crew;
pub mod gemini;

use async_trait::async_trait;

use crate::errors::Result;

/// Persona a text-generation call is made as.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentProfile {
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

impl AgentProfile {
    pub fn new(role: impl Into<String>, goal: impl Into<String>, backstory: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentTask {
    pub description: String,
    pub expected_output: String,
}

impl AgentTask {
    pub fn new(description: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
        }
    }
}

/// Text generation backend that can answer a task as a given agent.
#[async_trait]
pub trait TextGenerator {
    /// `context` carries the output of the previous task, if any.
    async fn generate(
        &self,
        agent: &AgentProfile,
        task: &AgentTask,
        context: Option<&str>,
    ) -> Result<String>;
}
