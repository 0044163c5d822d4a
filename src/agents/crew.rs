use tracing::info;

use super::{AgentProfile, AgentTask, TextGenerator};
use crate::errors::{Result, TalkgenError};

/// Agents and their tasks, run one after another.
#[derive(Debug, Clone, Default)]
pub struct Crew {
    steps: Vec<(AgentProfile, AgentTask)>,
}

/// Output of every step, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct CrewOutput {
    pub steps: Vec<StepOutput>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub role: String,
    pub output: String,
}

impl CrewOutput {
    /// Output of the last task.
    pub fn raw(&self) -> &str {
        self.steps.last().map(|step| step.output.as_str()).unwrap_or("")
    }
}

impl Crew {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, agent: AgentProfile, task: AgentTask) -> Self {
        self.steps.push((agent, task));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Strategist, copywriter and scriptwriter for a small-business niche.
    pub fn marketing(niche: &str, language: &str) -> Self {
        Self::new()
            .step(
                AgentProfile::new(
                    "Marketing Strategist",
                    format!("Create 3 post themes for the {niche} niche."),
                    "Branding specialist for small businesses.",
                ),
                AgentTask::new(
                    format!("Create 3 strategic post themes for the niche: {niche}. Write in {language}."),
                    "3 detailed post themes.",
                ),
            )
            .step(
                AgentProfile::new(
                    "Copywriter",
                    "Write persuasive captions with emojis.",
                    "Specialist in Instagram copy.",
                ),
                AgentTask::new(
                    format!("Write the captions for these themes. Write in {language}."),
                    "3 captions ready to post.",
                ),
            )
            .step(
                AgentProfile::new(
                    "Video Scriptwriter",
                    "Turn the best caption into a short spoken script for a talking avatar.",
                    "Writes natural, friendly scripts for short vertical videos.",
                ),
                AgentTask::new(
                    format!(
                        "Pick the strongest caption and rewrite it as a script of at most 60 seconds, \
                         spoken in first person, plain text only, no emojis or markdown. Write in {language}."
                    ),
                    "A single paragraph script ready to be spoken.",
                ),
            )
    }

    /// Run every task in order, feeding each output to the next task.
    #[tracing::instrument(skip(self, generator), fields(steps = self.steps.len()))]
    pub async fn kickoff<G>(&self, generator: &G) -> Result<CrewOutput>
    where
        G: TextGenerator + Sync + ?Sized,
    {
        if self.steps.is_empty() {
            return Err(TalkgenError::invalid_input("Crew has no tasks"));
        }

        let mut outputs: Vec<StepOutput> = Vec::with_capacity(self.steps.len());
        for (agent, task) in &self.steps {
            let context = outputs.last().map(|previous| previous.output.as_str());
            info!(role = %agent.role, "Running crew task");
            let output = generator.generate(agent, task, context).await?;
            outputs.push(StepOutput {
                role: agent.role.clone(),
                output,
            });
        }

        Ok(CrewOutput { steps: outputs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes the role and the context it was given.
    struct EchoGenerator {
        seen: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(
            &self,
            agent: &AgentProfile,
            _task: &AgentTask,
            context: Option<&str>,
        ) -> Result<String> {
            self.seen.lock().unwrap().push(context.map(str::to_string));
            Ok(format!("{} output", agent.role))
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(
            &self,
            _agent: &AgentProfile,
            _task: &AgentTask,
            _context: Option<&str>,
        ) -> Result<String> {
            Err(TalkgenError::generation("quota exceeded"))
        }
    }

    #[tokio::test]
    async fn test_kickoff_chains_context() {
        let generator = EchoGenerator {
            seen: Mutex::new(Vec::new()),
        };
        let crew = Crew::marketing("Doces artesanais", "Brazilian Portuguese");

        let output = crew.kickoff(&generator).await.unwrap();

        assert_eq!(output.steps.len(), 3);
        assert_eq!(output.raw(), "Video Scriptwriter output");
        assert_eq!(
            *generator.seen.lock().unwrap(),
            vec![
                None,
                Some("Marketing Strategist output".to_string()),
                Some("Copywriter output".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_kickoff_empty_crew_fails() {
        let err = Crew::new().kickoff(&FailingGenerator).await.unwrap_err();
        assert!(matches!(err, TalkgenError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_kickoff_propagates_generator_errors() {
        let crew = Crew::marketing("Arquitetura", "English");
        let err = crew.kickoff(&FailingGenerator).await.unwrap_err();
        assert!(matches!(err, TalkgenError::Generation(_)));
    }

    #[test]
    fn test_marketing_mentions_niche() {
        let crew = Crew::marketing("Arquitetura", "English");
        assert_eq!(crew.len(), 3);
        assert!(crew.steps[0].0.goal.contains("Arquitetura"));
        assert!(crew.steps[0].1.description.contains("Arquitetura"));
    }
}
