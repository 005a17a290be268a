//! Nomad v1 job models

use serde::{Deserialize, Serialize};

/// Response of job register and deregister calls
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobWriteResponse {
    #[serde(rename = "EvalID")]
    pub eval_id: Option<String>,
    pub job_modify_index: Option<u64>,
    pub warnings: Option<String>,
}
