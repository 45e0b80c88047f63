//! worker 错误类型

use thiserror::Error;

use mokadex::RokaMokaError;
use rokamoka_shared::error::SharedError;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("事件反序列化失败: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Domain(#[from] RokaMokaError),

    #[error(transparent)]
    Shared(#[from] SharedError),
}
