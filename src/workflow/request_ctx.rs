//! 请求处理上下文
//!
//! 封装"我正在处理第几个请求、生成什么类型"这一信息，用作日志前缀

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local};

use crate::models::DocumentType;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone)]
pub struct RequestCtx {
    /// 进程内递增的请求编号
    pub request_id: u64,
    pub document_type: DocumentType,
    pub received_at: DateTime<Local>,
}

impl RequestCtx {
    pub fn new(document_type: DocumentType) -> Self {
        Self {
            request_id: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed),
            document_type,
            received_at: Local::now(),
        }
    }

    /// 从接收到现在经过的毫秒数
    pub fn elapsed_ms(&self) -> i64 {
        (Local::now() - self.received_at).num_milliseconds()
    }

    /// 输出文件名，保证并发请求之间不冲突
    pub fn output_file_name(&self) -> String {
        format!(
            "docgen-{}-{}-{}.{}",
            std::process::id(),
            self.received_at.format("%Y%m%d%H%M%S"),
            self.request_id,
            self.document_type.extension()
        )
    }
}

impl Display for RequestCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[请求 #{} {}]", self.request_id, self.document_type)
    }
}
