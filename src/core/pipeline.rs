//! Ordered, fail-fast step execution.
//!
//! Steps run strictly in declaration order. The first failure halts the
//! pipeline; remaining steps are reported as skipped. The failing step's
//! original error is kept intact so callers can map its code to an exit
//! code without losing the error kind. Partial effects of earlier steps
//! are left in place.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

pub struct Step<'a> {
    pub name: &'static str,
    pub label: String,
    pub action: Box<dyn FnOnce() -> Result<Value> + 'a>,
}

impl<'a> Step<'a> {
    pub fn new(
        name: &'static str,
        label: impl Into<String>,
        action: impl FnOnce() -> Result<Value> + 'a,
    ) -> Self {
        Self {
            name,
            label: label.into(),
            action: Box::new(action),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub name: String,
    pub label: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<Value>,
}

#[derive(Debug)]
pub struct PipelineOutcome {
    pub succeeded: bool,
    pub steps: Vec<StepReport>,
    pub failed_step: Option<String>,
    /// Original error of the failed step, unmodified.
    pub cause: Option<Error>,
}

pub fn run(steps: Vec<Step>) -> PipelineOutcome {
    let mut reports = Vec::with_capacity(steps.len());
    let mut failed_step: Option<String> = None;
    let mut cause: Option<Error> = None;

    for step in steps {
        if failed_step.is_some() {
            reports.push(StepReport {
                name: step.name.to_string(),
                label: step.label,
                status: StepStatus::Skipped,
                data: None,
                error: None,
                error_code: None,
                error_details: None,
            });
            continue;
        }

        log_status!("pipeline", "{}", step.label);

        match (step.action)() {
            Ok(data) => reports.push(StepReport {
                name: step.name.to_string(),
                label: step.label,
                status: StepStatus::Success,
                data: Some(data),
                error: None,
                error_code: None,
                error_details: None,
            }),
            Err(err) => {
                reports.push(StepReport {
                    name: step.name.to_string(),
                    label: step.label,
                    status: StepStatus::Failed,
                    data: None,
                    error: Some(err.message.clone()),
                    error_code: Some(err.code.as_str().to_string()),
                    error_details: Some(err.details.clone()),
                });
                failed_step = Some(step.name.to_string());
                cause = Some(err);
            }
        }
    }

    PipelineOutcome {
        succeeded: failed_step.is_none(),
        steps: reports,
        failed_step,
        cause,
    }
}
