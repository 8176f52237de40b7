//! In-memory stack provider
//!
//! Keeps stacks in a map and records every call. Used by the tests of crates
//! that drive workflows without a real orchestration service.

use crate::provider::{
    ProviderError, ProviderErrorKind, StackOptions, StackProvider, StackStatus, StackSummary,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// A provider call, as recorded by [`InMemoryStackProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Validate,
    Describe(String),
    CreateOrUpdate { stack: String, options: StackOptions },
    Delete(String),
}

#[derive(Debug, Clone)]
struct StoredStack {
    document: String,
    options: StackOptions,
    summary: StackSummary,
}

#[derive(Default)]
pub struct InMemoryStackProvider {
    stacks: Mutex<BTreeMap<String, StoredStack>>,
    calls: Mutex<Vec<ProviderCall>>,
    fail_validate: Mutex<Option<ProviderError>>,
    fail_apply: Mutex<Option<ProviderError>>,
}

impl InMemoryStackProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-create a stack in `*_COMPLETE` state
    pub fn with_stack(self, name: &str, outputs: &[(&str, &str)]) -> Self {
        let mut summary = StackSummary::new(name, "CREATE_COMPLETE");
        summary.outputs = outputs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.lock_stacks().insert(
            name.to_string(),
            StoredStack {
                document: String::new(),
                options: StackOptions::default(),
                summary,
            },
        );
        self
    }

    /// Make every subsequent `validate` fail with `error`
    pub fn fail_validation(&self, error: ProviderError) {
        *self.fail_validate.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    /// Make every subsequent `create_or_update` fail with `error`
    pub fn fail_apply(&self, error: ProviderError) {
        *self.fail_apply.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn stack_names(&self) -> Vec<String> {
        self.lock_stacks().keys().cloned().collect()
    }

    pub fn document(&self, name: &str) -> Option<String> {
        self.lock_stacks().get(name).map(|s| s.document.clone())
    }

    pub fn options(&self, name: &str) -> Option<StackOptions> {
        self.lock_stacks().get(name).map(|s| s.options.clone())
    }

    fn record(&self, call: ProviderCall) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
    }

    fn lock_stacks(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, StoredStack>> {
        self.stacks.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl StackProvider for InMemoryStackProvider {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn validate(&self, _document: &str) -> Result<(), ProviderError> {
        self.record(ProviderCall::Validate);
        match self.fail_validate.lock().unwrap_or_else(|e| e.into_inner()).clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn describe(&self, stack_name: &str) -> Result<Option<StackSummary>, ProviderError> {
        self.record(ProviderCall::Describe(stack_name.to_string()));
        Ok(self.lock_stacks().get(stack_name).map(|s| s.summary.clone()))
    }

    async fn create_or_update(
        &self,
        stack_name: &str,
        document: &str,
        options: &StackOptions,
    ) -> Result<StackStatus, ProviderError> {
        self.record(ProviderCall::CreateOrUpdate {
            stack: stack_name.to_string(),
            options: options.clone(),
        });
        if let Some(e) = self.fail_apply.lock().unwrap_or_else(|e| e.into_inner()).clone() {
            return Err(e);
        }

        let mut stacks = self.lock_stacks();
        match stacks.get_mut(stack_name) {
            Some(existing) if existing.document == document && existing.options == *options => {
                Err(ProviderError::new(
                    ProviderErrorKind::NoUpdates,
                    "ValidationError",
                    "No updates are to be performed.",
                ))
            }
            Some(existing) => {
                existing.document = document.to_string();
                existing.options = options.clone();
                existing.summary.status = "UPDATE_COMPLETE".to_string();
                Ok(StackStatus::Updated)
            }
            None => {
                stacks.insert(
                    stack_name.to_string(),
                    StoredStack {
                        document: document.to_string(),
                        options: options.clone(),
                        summary: StackSummary::new(stack_name, "CREATE_COMPLETE"),
                    },
                );
                Ok(StackStatus::Created)
            }
        }
    }

    async fn delete(&self, stack_name: &str) -> Result<(), ProviderError> {
        self.record(ProviderCall::Delete(stack_name.to_string()));
        match self.lock_stacks().remove(stack_name) {
            Some(_) => Ok(()),
            None => Err(ProviderError::new(
                ProviderErrorKind::NotFound,
                "ValidationError",
                format!("Stack with id {stack_name} does not exist"),
            )),
        }
    }
}
