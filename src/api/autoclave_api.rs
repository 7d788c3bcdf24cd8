// ==========================================
// 加气混凝土质量分析 - 蒸压釜记录 API
// ==========================================
// 职责: 日期参数校验 → 按日期区间列出蒸压釜记录
// ==========================================

use crate::api::error::ApiResult;
use crate::engine::period::parse_query_date;
use crate::repository::autoclave_repo::AutoclaveRecordRepository;
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

pub struct AutoclaveApi {
    autoclave_repo: Arc<AutoclaveRecordRepository>,
}

impl AutoclaveApi {
    pub fn new(autoclave_repo: Arc<AutoclaveRecordRepository>) -> Self {
        Self { autoclave_repo }
    }

    /// 蒸压釜记录列表; 区间内无记录时返回空列表
    #[instrument(skip(self))]
    pub fn list_autoclave_records(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> ApiResult<Vec<Value>> {
        let start = start_date
            .filter(|v| !v.trim().is_empty())
            .map(|v| parse_query_date("start_date", v))
            .transpose()?;
        let end = end_date
            .filter(|v| !v.trim().is_empty())
            .map(|v| parse_query_date("end_date", v))
            .transpose()?;

        Ok(self.autoclave_repo.find(start, end)?)
    }
}
