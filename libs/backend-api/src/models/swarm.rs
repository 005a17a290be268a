//! Docker Engine service models

use serde::{Deserialize, Serialize};

/// Response of `POST /services/create`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceCreateResponse {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
}
