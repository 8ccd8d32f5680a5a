use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 上游一页数据，缓存里存的就是它
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetPage {
    pub total: u64,
    pub records: Vec<Value>,
}

/// `datastore_search` 的响应外壳
#[derive(Debug, Deserialize)]
pub(crate) struct DatastoreEnvelope {
    pub success: bool,
    #[serde(default)]
    pub result: Option<DatasetPage>,
    #[serde(default)]
    pub error: Option<Value>,
}

/// 一次上游查询的参数，值按原样透传
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: String,
    pub offset: String,
    pub filters: Vec<(&'static str, String)>,
}

impl PageRequest {
    /// 以 datastore `filters` 参数的格式编码过滤条件，没有条件时返回 None
    pub(crate) fn filters_param(&self) -> Option<String> {
        if self.filters.is_empty() {
            return None;
        }
        let object: serde_json::Map<String, Value> = self
            .filters
            .iter()
            .map(|(name, value)| (name.to_string(), Value::from(value.as_str())))
            .collect();
        Some(Value::Object(object).to_string())
    }
}
