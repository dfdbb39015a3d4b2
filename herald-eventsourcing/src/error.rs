//! 事件溯源层统一错误定义
//!
use herald_messages::BrokerError;
use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EventSourcingError {
    /// 重放折叠遇到聚合未登记 apply 入口的事件类型
    #[error("no apply registered: aggregate={aggregate}, event_type={event_type}")]
    UnhandledEvent {
        aggregate: &'static str,
        event_type: &'static str,
    },

    /// 仓储以处理器身份参与分发时传播的经纪人错误
    #[error("broker: {0}")]
    Broker(#[from] BrokerError),
}

pub type EventSourcingResult<T> = Result<T, EventSourcingError>;
