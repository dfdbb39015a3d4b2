//! 消息经纪人（broker）
//!
//! `MessageBroker` 是事件与请求两个经纪人的门面：二者共享同一根作用域
//! 与同一份配置，订阅入口按消息角色静态分流（事件/请求的能力校验即
//! trait 约束，不存在运行时的订阅失败）。
//!
mod event_broker;
mod registry;
mod request_broker;

pub use event_broker::{AsyncDispatch, EventBroker};
pub use request_broker::RequestBroker;

use crate::error::BrokerResult;
use crate::event::DomainEvent;
use crate::handle::{Handle, HandleAsync, HandleRequest, HandleRequestAsync};
use crate::request::DomainRequest;
use crate::scope::{HandlerScope, ScopeBehaviour};
use bon::Builder;
use std::sync::Arc;

/// 经纪人配置
#[derive(Builder, Clone, Copy, Debug, Default)]
pub struct BrokerConfig {
    /// 分发调用的子作用域创建策略
    #[builder(default)]
    pub scope_behaviour: ScopeBehaviour,
    /// 异步段的完成语义
    #[builder(default)]
    pub async_dispatch: AsyncDispatch,
}

/// 消息经纪人门面：发布事件、发起请求、多播请求
pub struct MessageBroker {
    events: EventBroker,
    requests: RequestBroker,
}

impl MessageBroker {
    pub fn new(scope: Arc<dyn HandlerScope>, behaviour: ScopeBehaviour) -> Self {
        Self::with_config(
            scope,
            BrokerConfig {
                scope_behaviour: behaviour,
                async_dispatch: AsyncDispatch::default(),
            },
        )
    }

    pub fn with_config(scope: Arc<dyn HandlerScope>, config: BrokerConfig) -> Self {
        Self {
            events: EventBroker::new(
                Arc::clone(&scope),
                config.scope_behaviour,
                config.async_dispatch,
            ),
            requests: RequestBroker::new(scope, config.scope_behaviour),
        }
    }

    /// 订阅同步事件处理器
    pub fn subscribe<M, H>(&self)
    where
        M: DomainEvent + ?Sized,
        H: Handle<M> + 'static,
    {
        self.events.subscribe::<M, H>();
    }

    /// 订阅异步事件处理器
    pub fn subscribe_async<M, H>(&self)
    where
        M: DomainEvent + ?Sized,
        H: HandleAsync<M> + 'static,
    {
        self.events.subscribe_async::<M, H>();
    }

    /// 订阅同步请求处理器
    pub fn subscribe_request<R, H>(&self)
    where
        R: DomainRequest + ?Sized,
        H: HandleRequest<R> + 'static,
    {
        self.requests.subscribe::<R, H>();
    }

    /// 订阅异步请求处理器
    pub fn subscribe_request_async<R, H>(&self)
    where
        R: DomainRequest + ?Sized,
        H: HandleRequestAsync<R> + 'static,
    {
        self.requests.subscribe_async::<R, H>();
    }

    /// 发布事件；完成语义见 [`AsyncDispatch`]
    pub async fn publish<E: DomainEvent>(&self, event: E) -> BrokerResult<()> {
        self.events.publish(event).await
    }

    /// 单胜者请求
    pub async fn request<R: DomainRequest>(
        &self,
        request: R,
    ) -> BrokerResult<Option<R::Response>> {
        self.requests.request(request).await
    }

    /// 多播请求
    pub async fn multicast_request<R: DomainRequest>(
        &self,
        request: R,
    ) -> BrokerResult<Vec<R::Response>> {
        self.requests.multicast_request(request).await
    }
}
