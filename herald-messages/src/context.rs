//! 经纪人上下文（BrokerContext）
//!
//! 显式传递的经纪人引用载体：挂接一次、到处使用。未挂接即访问会失败，
//! 该契约通过 `OnceLock` 的显式初始化校验实现，不依赖任何进程级全局
//! 状态 —— 调用方把上下文注入到需要发布事件的单元中即可。
//!
use crate::broker::MessageBroker;
use crate::error::{BrokerError, BrokerResult};
use crate::event::DomainEvent;
use crate::request::DomainRequest;
use std::sync::{Arc, OnceLock};

/// 挂接一次的经纪人访问上下文
#[derive(Default)]
pub struct BrokerContext {
    broker: OnceLock<Arc<MessageBroker>>,
}

impl BrokerContext {
    pub const fn new() -> Self {
        Self {
            broker: OnceLock::new(),
        }
    }

    /// 挂接经纪人；重复挂接是错误
    pub fn attach(&self, broker: Arc<MessageBroker>) -> BrokerResult<()> {
        self.broker
            .set(broker)
            .map_err(|_| BrokerError::AlreadyConfigured)
    }

    /// 取出经纪人；未挂接时失败
    pub fn broker(&self) -> BrokerResult<&Arc<MessageBroker>> {
        self.broker.get().ok_or(BrokerError::NotConfigured {
            reason: "no broker attached to this context",
        })
    }

    pub async fn publish<E: DomainEvent>(&self, event: E) -> BrokerResult<()> {
        self.broker()?.publish(event).await
    }

    pub async fn request<R: DomainRequest>(
        &self,
        request: R,
    ) -> BrokerResult<Option<R::Response>> {
        self.broker()?.request(request).await
    }

    pub async fn multicast_request<R: DomainRequest>(
        &self,
        request: R,
    ) -> BrokerResult<Vec<R::Response>> {
        self.broker()?.multicast_request(request).await
    }
}
