//! Structured and plain-text reports
//!
//! The text form is consumed by a chat summarization layer, so its shape
//! is fixed: a device header line, an eligibility line, a blank line and
//! the detail block with one message per line.

use std::fmt;

use serde::Serialize;

use crate::engine::decider::ActivationOutcome;
use crate::engine::evaluator::{DependencyFault, DependencyVerdict};
use crate::engine::fsm::ActivationState;

/// Final report for one device command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub target_device_name: String,
    pub can_activate: bool,
    /// Dependency messages in order, then the summary, then the outcome
    pub ordered_messages: Vec<String>,
    pub verdicts: Vec<DependencyVerdict>,
    pub outcome: ActivationOutcome,
}

impl Report {
    pub fn final_state(&self) -> ActivationState {
        self.outcome.state
    }

    /// Dependencies that blocked activation, with their fault class
    pub fn blocked_by(&self) -> Vec<(&str, DependencyFault)> {
        self.verdicts
            .iter()
            .filter_map(|v| v.fault.map(|fault| (v.device_id.as_str(), fault)))
            .collect()
    }

    /// Plain-text rendering
    pub fn render(&self) -> String {
        format!(
            "設備：{}\n狀態：{}\n\n詳細信息：\n{}",
            self.target_device_name,
            if self.can_activate { "可以執行" } else { "無法執行" },
            self.ordered_messages.join("\n")
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Aggregate eligibility sentence
pub fn summary_message(target_name: &str, can_activate: bool) -> String {
    format!(
        "{}關聯設備狀態正常，{}{}安全執行",
        if can_activate { "所有" } else { "部分" },
        target_name,
        if can_activate { "可以" } else { "無法" }
    )
}

/// Join a multi-line message into one detail line
fn one_line(message: &str) -> String {
    if !message.contains(['\r', '\n']) {
        return message.to_string();
    }
    message
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Assemble the report
pub fn build(target_name: &str, verdicts: &[DependencyVerdict], outcome: &ActivationOutcome) -> Report {
    let mut ordered_messages: Vec<String> = verdicts.iter().map(|v| one_line(&v.message)).collect();
    ordered_messages.push(summary_message(target_name, outcome.can_activate));
    ordered_messages.push(one_line(&outcome.message));

    Report {
        target_device_name: target_name.to_string(),
        can_activate: outcome.can_activate,
        ordered_messages,
        verdicts: verdicts.to_vec(),
        outcome: outcome.clone(),
    }
}
