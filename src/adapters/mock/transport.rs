//! Scriptable realtime transport for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::traits::{RealtimeTransport, TransportError};

/// What the mock does with each operation.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Every operation succeeds.
    Succeed,
    /// Every operation fails with the structured unavailable signal.
    Unavailable,
    /// Every operation fails with a business-level rejection.
    Reject(String),
    /// Every operation fails as if the network dropped.
    NetworkFail(String),
}

/// A recorded write for verification.
#[derive(Debug, Clone)]
pub struct RecordedWrite {
    pub path: String,
    pub value: Value,
}

struct MockTransportState {
    behavior: MockBehavior,
    writes: Vec<RecordedWrite>,
    reads: Vec<String>,
    deletes: Vec<String>,
    read_result: Option<Value>,
}

pub struct MockTransport {
    name: &'static str,
    state: Mutex<MockTransportState>,
}

impl MockTransport {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(MockTransportState {
                behavior: MockBehavior::Succeed,
                writes: Vec::new(),
                reads: Vec::new(),
                deletes: Vec::new(),
                read_result: None,
            }),
        }
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        self.state.lock().unwrap().behavior = behavior;
    }

    pub fn set_read_result(&self, value: Option<Value>) {
        self.state.lock().unwrap().read_result = value;
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().unwrap().writes.len()
    }

    pub fn reads(&self) -> Vec<String> {
        self.state.lock().unwrap().reads.clone()
    }

    pub fn read_count(&self) -> usize {
        self.state.lock().unwrap().reads.len()
    }

    pub fn delete_count(&self) -> usize {
        self.state.lock().unwrap().deletes.len()
    }

    fn outcome(&self) -> Result<(), TransportError> {
        match &self.state.lock().unwrap().behavior {
            MockBehavior::Succeed => Ok(()),
            MockBehavior::Unavailable => Err(TransportError::Unavailable {
                message: format!("{} transport scripted as unavailable", self.name),
            }),
            MockBehavior::Reject(message) => Err(TransportError::Rejected(message.clone())),
            MockBehavior::NetworkFail(message) => Err(TransportError::Network(message.clone())),
        }
    }
}

#[async_trait]
impl RealtimeTransport for MockTransport {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn write(&self, path: &str, value: &Value) -> Result<(), TransportError> {
        self.state.lock().unwrap().writes.push(RecordedWrite {
            path: path.to_string(),
            value: value.clone(),
        });
        self.outcome()
    }

    async fn read(&self, path: &str) -> Result<Option<Value>, TransportError> {
        self.state.lock().unwrap().reads.push(path.to_string());
        self.outcome()?;
        Ok(self.state.lock().unwrap().read_result.clone())
    }

    async fn delete(&self, path: &str) -> Result<(), TransportError> {
        self.state.lock().unwrap().deletes.push(path.to_string());
        self.outcome()
    }
}
