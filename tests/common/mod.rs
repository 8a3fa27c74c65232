//! Shared test utilities

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use krishna_voice::{Error, LanguageModel, ReplyService, Result};

/// Pipeline stage a prompt belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Normalize,
    Classify,
    Generate,
}

impl Stage {
    /// Identify the stage from the prompt text
    pub fn of(prompt: &str) -> Self {
        if prompt.contains("classified as:") {
            Self::Generate
        } else if prompt.contains("intent classifier") {
            Self::Classify
        } else {
            Self::Normalize
        }
    }
}

type Script = Box<dyn Fn(Stage, &str) -> Result<String> + Send + Sync>;

/// Model whose answers are scripted per pipeline stage
pub struct ScriptedModel {
    script: Script,
    seen: Mutex<Vec<Stage>>,
}

impl ScriptedModel {
    pub fn new(script: impl Fn(Stage, &str) -> Result<String> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Classify as `intent` and generate `response`; normalization echoes English
    pub fn answering(intent: &'static str, response: &'static str) -> Arc<Self> {
        Self::new(move |stage, _| match stage {
            Stage::Normalize => Ok("I am confused about my career".to_string()),
            Stage::Classify => Ok(format!("Intent: {intent}")),
            Stage::Generate => Ok(response.to_string()),
        })
    }

    /// Fail `failing` with a quota error, answer every other stage
    pub fn exhausted_at(failing: Stage) -> Arc<Self> {
        Self::new(move |stage, _| {
            if stage == failing {
                return Err(Error::RateLimited {
                    message: "RESOURCE_EXHAUSTED".to_string(),
                    retry_after: None,
                });
            }
            match stage {
                Stage::Normalize => Ok("My family does not understand me".to_string()),
                Stage::Classify => Ok("Intent: Relationships".to_string()),
                Stage::Generate => Ok("Prem dhairya maangta hai.".to_string()),
            }
        })
    }

    /// Stages called so far, in order
    pub fn stages(&self) -> Vec<Stage> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls(&self, stage: Stage) -> usize {
        self.stages().iter().filter(|s| **s == stage).count()
    }

    pub fn total_calls(&self) -> usize {
        self.stages().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let stage = Stage::of(prompt);
        self.seen.lock().unwrap().push(stage);
        (self.script)(stage, prompt)
    }
}

/// Reply service on a scripted model
pub fn service(model: &Arc<ScriptedModel>) -> ReplyService {
    ReplyService::new(model.clone())
}
