//! 订阅清单（SubscriptionSet）
//!
//! 启动期显式构建的注册列表，替代全程序类型扫描：每一项是一对
//! (消息类型, 处理器类型)，应用到经纪人时按加入顺序逐项订阅。
//! 对同一经纪人重复应用是允许的 —— 重复注册会各自触发。
//!
use crate::broker::MessageBroker;
use crate::event::DomainEvent;
use crate::handle::{Handle, HandleAsync, HandleRequest, HandleRequestAsync};
use crate::request::DomainRequest;
use std::any::type_name;

type SubscribeFn = Box<dyn Fn(&MessageBroker) + Send + Sync>;

struct Entry {
    message: &'static str,
    handler: &'static str,
    subscribe: SubscribeFn,
}

/// 显式订阅清单
#[derive(Default)]
pub struct SubscriptionSet {
    entries: Vec<Entry>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入一条同步事件订阅
    pub fn event<M, H>(mut self) -> Self
    where
        M: DomainEvent + ?Sized,
        H: Handle<M> + 'static,
    {
        self.entries.push(Entry {
            message: type_name::<M>(),
            handler: type_name::<H>(),
            subscribe: Box::new(|broker| broker.subscribe::<M, H>()),
        });
        self
    }

    /// 加入一条异步事件订阅
    pub fn event_async<M, H>(mut self) -> Self
    where
        M: DomainEvent + ?Sized,
        H: HandleAsync<M> + 'static,
    {
        self.entries.push(Entry {
            message: type_name::<M>(),
            handler: type_name::<H>(),
            subscribe: Box::new(|broker| broker.subscribe_async::<M, H>()),
        });
        self
    }

    /// 加入一条同步请求订阅
    pub fn request<R, H>(mut self) -> Self
    where
        R: DomainRequest + ?Sized,
        H: HandleRequest<R> + 'static,
    {
        self.entries.push(Entry {
            message: type_name::<R>(),
            handler: type_name::<H>(),
            subscribe: Box::new(|broker| broker.subscribe_request::<R, H>()),
        });
        self
    }

    /// 加入一条异步请求订阅
    pub fn request_async<R, H>(mut self) -> Self
    where
        R: DomainRequest + ?Sized,
        H: HandleRequestAsync<R> + 'static,
    {
        self.entries.push(Entry {
            message: type_name::<R>(),
            handler: type_name::<H>(),
            subscribe: Box::new(|broker| broker.subscribe_request_async::<R, H>()),
        });
        self
    }

    /// 将全部订阅按序应用到经纪人
    pub fn apply(&self, broker: &MessageBroker) {
        for entry in &self.entries {
            tracing::debug!(
                message = entry.message,
                handler = entry.handler,
                "applying subscription"
            );
            (entry.subscribe)(broker);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
