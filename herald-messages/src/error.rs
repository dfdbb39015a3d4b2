//! 消息核心统一错误定义
//!
//! 聚焦作用域/解析、处理器执行与类型擦除还原的最小必要集合；
//! 订阅阶段的能力校验与请求的自引用约束均由 trait 约束在编译期承担，
//! 因此不存在对应的运行时变体。
//!
use thiserror::Error;

/// 统一错误类型（消息核心最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BrokerError {
    // --- 上下文/配置 ---
    #[error("broker not configured: {reason}")]
    NotConfigured { reason: &'static str },
    #[error("broker already configured")]
    AlreadyConfigured,

    // --- 作用域与处理器构造 ---
    #[error("scope error: {reason}")]
    Scope { reason: String },
    #[error("handler resolution failed: handler={handler}, reason={reason}")]
    Resolve {
        handler: &'static str,
        reason: String,
    },

    // --- 处理器执行（按原样向发布/请求方传播）---
    #[error("event handler error: handler={handler}, reason={reason}")]
    EventHandler { handler: String, reason: String },
    #[error("request handler error: handler={handler}, reason={reason}")]
    RequestHandler { handler: String, reason: String },

    // --- 类型擦除还原 ---
    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

pub type BrokerResult<T> = Result<T, BrokerError>;
