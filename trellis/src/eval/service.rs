//! Federated service dispatch.
//!
//! Endpoints are synchronous: they get the `SERVICE` body and one page of
//! input solutions and return solutions. A timeout is enforced by running
//! the call on the blocking pool of a private current-thread tokio runtime
//! and racing it against `tokio::time::timeout`. The runtime is built on
//! first use, so evaluations that never time a service never pay for it.
//!
//! A timed-out call is abandoned, not cancelled: its thread finishes in the
//! background and its result is dropped.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::{Builder, Runtime};

use crate::binding::Binding;
use crate::query::Operator;
use crate::types::Term;

/// Error reported by a service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    Failed(String),
    Timeout(Duration),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(message) => write!(f, "{message}"),
            Self::Timeout(limit) => write!(f, "timed out after {}ms", limit.as_millis()),
        }
    }
}

impl std::error::Error for ServiceError {}

/// A remote (or simulated) SPARQL endpoint.
pub trait ServiceEndpoint: Send + Sync {
    /// Evaluate `body` for the given input solutions.
    fn evaluate(&self, body: &Operator, input: &[Binding]) -> Result<Vec<Binding>, ServiceError>;
}

impl<F> ServiceEndpoint for F
where
    F: Fn(&Operator, &[Binding]) -> Result<Vec<Binding>, ServiceError> + Send + Sync,
{
    fn evaluate(&self, body: &Operator, input: &[Binding]) -> Result<Vec<Binding>, ServiceError> {
        self(body, input)
    }
}

/// Endpoints by IRI.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    endpoints: HashMap<String, Arc<dyn ServiceEndpoint>>,
}

impl ServiceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, iri: impl Into<String>, endpoint: impl ServiceEndpoint + 'static) {
        self.endpoints.insert(iri.into(), Arc::new(endpoint));
    }

    #[must_use]
    pub fn get(&self, endpoint: &Term) -> Option<&Arc<dyn ServiceEndpoint>> {
        self.endpoints.get(endpoint.label())
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iris: Vec<&String> = self.endpoints.keys().collect();
        iris.sort();
        f.debug_struct("ServiceRegistry").field("endpoints", &iris).finish()
    }
}

/// Lazily built runtime used to bound service calls.
#[derive(Default)]
pub struct ServiceRuntime {
    runtime: Mutex<Option<Arc<Runtime>>>,
}

impl ServiceRuntime {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn runtime(&self) -> Result<Arc<Runtime>, ServiceError> {
        let mut slot = self
            .runtime
            .lock()
            .map_err(|_| ServiceError::Failed("service runtime lock poisoned".to_owned()))?;
        if let Some(runtime) = slot.as_ref() {
            return Ok(Arc::clone(runtime));
        }
        let runtime = Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| ServiceError::Failed(format!("cannot start service runtime: {e}")))?;
        tracing::debug!("service runtime started");
        let runtime = Arc::new(runtime);
        *slot = Some(Arc::clone(&runtime));
        Ok(runtime)
    }

    /// Call `endpoint`, giving up after `timeout` when one is set.
    ///
    /// Must not be called from inside an async context.
    pub fn call(
        &self,
        endpoint: &Arc<dyn ServiceEndpoint>,
        body: &Operator,
        input: &[Binding],
        timeout: Option<Duration>,
    ) -> Result<Vec<Binding>, ServiceError> {
        let Some(limit) = timeout else {
            return endpoint.evaluate(body, input);
        };
        let runtime = self.runtime()?;
        let endpoint = Arc::clone(endpoint);
        let body = body.clone();
        let input = input.to_vec();
        runtime.block_on(async move {
            let task = tokio::task::spawn_blocking(move || endpoint.evaluate(&body, &input));
            match tokio::time::timeout(limit, task).await {
                Ok(Ok(result)) => result,
                Ok(Err(join_error)) => Err(ServiceError::Failed(format!(
                    "service call panicked: {join_error}"
                ))),
                Err(_) => {
                    tracing::warn!("service call timed out after {}ms", limit.as_millis());
                    Err(ServiceError::Timeout(limit))
                }
            }
        })
    }
}

impl Drop for ServiceRuntime {
    fn drop(&mut self) {
        let runtime = match self.runtime.get_mut() {
            Ok(slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(runtime) = runtime.and_then(|rt| Arc::try_unwrap(rt).ok()) {
            runtime.shutdown_background();
        }
    }
}

impl fmt::Debug for ServiceRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let started = self.runtime.lock().is_ok_and(|slot| slot.is_some());
        f.debug_struct("ServiceRuntime").field("started", &started).finish()
    }
}
