use async_trait::async_trait;
use pid_analyzer::{
    Error, Result,
    llm::{GenerationRequest, ModelClient},
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock model client that replays scripted answers and records every request
#[derive(Debug, Default)]
pub struct MockModelClient {
    pub responses: Mutex<VecDeque<std::result::Result<String, String>>>,
    pub requests: Mutex<Vec<GenerationRequest>>,
    pub delay: Mutex<Option<Duration>>,
}

impl MockModelClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answers(answers: &[&str]) -> Arc<Self> {
        let mock = Self::new();
        for answer in answers {
            mock.add_answer(answer);
        }
        Arc::new(mock)
    }

    pub fn add_answer(&self, answer: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(answer.to_string()));
    }

    pub fn add_failure(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    /// Makes every later call wait before answering
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn get_requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(answer)) => Ok(answer),
            Some(Err(message)) => Err(Error::llm(message)),
            None => Err(Error::llm("No more mock responses available")),
        }
    }
}
