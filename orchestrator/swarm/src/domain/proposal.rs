// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0

use hive_core::domain::message::COORDINATOR_ID;
use hive_core::domain::task::CoordinationTask;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalKind {
    TaskCoordination,
}

/// Proposal submitted to a consensus manager. The payload is the task itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    #[serde(rename = "type")]
    pub kind: ProposalKind,
    pub payload: CoordinationTask,
    pub proposer_id: String,
}

impl Proposal {
    pub fn task_coordination(task: &CoordinationTask) -> Self {
        Self {
            kind: ProposalKind::TaskCoordination,
            payload: task.clone(),
            proposer_id: COORDINATOR_ID.to_string(),
        }
    }
}
