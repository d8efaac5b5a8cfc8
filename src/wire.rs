use serde::{Deserialize, Serialize};

pub const JSONRPC_VERSION: &str = "2.0";
pub const HANDLE_JOBS_METHOD: &str = "LMT_handle_jobs";

#[derive(Debug, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub id: u64,
    pub params: Params,
}

#[derive(Debug, Serialize)]
pub struct Params {
    pub jobs: Vec<Job>,
    pub lang: Lang,
}

#[derive(Debug, Serialize)]
pub struct Job {
    pub kind: &'static str,
    pub raw_en_sentence: String,
}

#[derive(Debug, Serialize)]
pub struct Lang {
    pub user_preferred_langs: Vec<String>,
    pub source_lang_user_selected: String,
    pub target_lang: String,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub result: Option<HandleJobsResult>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HandleJobsResult {
    #[serde(default)]
    pub source_lang: Option<String>,
    #[serde(default)]
    pub target_lang: Option<String>,
    #[serde(default)]
    pub translations: Vec<JobTranslation>,
}

#[derive(Debug, Deserialize)]
pub struct JobTranslation {
    #[serde(default)]
    pub beams: Vec<WireBeam>,
}

#[derive(Debug, Deserialize)]
pub struct WireBeam {
    #[serde(default)]
    pub postprocessed_sentence: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default, rename = "totalLogProb")]
    pub total_log_prob: Option<f64>,
    #[serde(default)]
    pub num_symbols: Option<u32>,
}
