use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::upstream::{DatasetPage, PageRequest};

const DEFAULT_LIMIT: &str = "100";
const DEFAULT_OFFSET: &str = "0";

/// 对外暴露的一个上游数据集
#[derive(Debug, Clone, Copy)]
pub struct Dataset {
    /// 路由名，同时是缓存键前缀
    pub name: &'static str,
    /// 参与缓存键的过滤条件，顺序固定
    pub filters: [&'static str; 2],
}

pub const RECEITAS: Dataset = Dataset {
    name: "receitas",
    filters: ["orgao", "categoria"],
};

pub const DESPESAS: Dataset = Dataset {
    name: "despesas",
    filters: ["categoria", "orgao"],
};

#[derive(Debug, Default, Deserialize)]
pub struct DatasetQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub orgao: Option<String>,
    pub categoria: Option<String>,
}

impl DatasetQuery {
    /// 空字符串等同于未提供
    pub fn filter(&self, name: &str) -> Option<&str> {
        let value = match name {
            "orgao" => self.orgao.as_deref(),
            "categoria" => self.categoria.as_deref(),
            _ => None,
        };
        value.filter(|v| !v.is_empty())
    }

    pub fn filters_for(&self, dataset: &Dataset) -> Vec<(&'static str, Option<&str>)> {
        dataset
            .filters
            .iter()
            .map(|name| (*name, self.filter(name)))
            .collect()
    }

    pub fn page_request(&self, dataset: &Dataset) -> PageRequest {
        let or_default = |value: &Option<String>, default: &str| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        };

        PageRequest {
            limit: or_default(&self.limit, DEFAULT_LIMIT),
            offset: or_default(&self.offset, DEFAULT_OFFSET),
            filters: self
                .filters_for(dataset)
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name, v.to_string())))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DatasetResponse {
    pub success: bool,
    pub cached: bool,
    #[serde(flatten)]
    pub page: Arc<DatasetPage>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub success: bool,
    pub message: String,
    pub cleared_keys: usize,
    pub timestamp: String,
}
