// ==========================================
// 产线产能模拟 - 引擎层错误类型
// ==========================================

use crate::repository::error::RepositoryError;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("日期区间无效: start={start} 晚于 end={end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("模拟跨度过长: {days} 天 (上限 {max_days} 天)")]
    RangeTooLong { days: i64, max_days: i64 },

    #[error("输入无效 ({field}): {message}")]
    InvalidInput { field: String, message: String },

    #[error("{entity} 不存在: {id}")]
    NotFound { entity: String, id: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
