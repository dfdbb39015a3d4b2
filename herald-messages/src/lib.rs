//! 进程内领域消息核心（herald-messages）
//!
//! 让生产方无需静态认识消费方即可发布领域事件或发起领域请求：
//! - 事件经纪人（`broker::EventBroker`）：扇出发布/订阅，同步+异步两段；
//! - 请求经纪人（`broker::RequestBroker`）：单胜者与多播两种请求/应答；
//! - 切面分发（`dispatch`）：按“接口键在前、具体类型键在后”的顺序解析；
//! - 作用域策略（`scope`）：处理器实例化的隔离与生命周期；
//! - 订阅清单（`subscriptions`）与经纪人上下文（`context`）。
//!
//! 本 crate 只做进程内分发，不含跨进程投递、持久化与事件版本迁移；
//! 事件存储与聚合重放见 herald-eventsourcing。
//!
//! 典型用法：
//! 1. 定义事件/请求类型并实现对应能力标记；
//! 2. 实现 `Handle`/`HandleAsync`/`HandleRequest*` 处理器；
//! 3. 在启动期通过 `SubscriptionSet` 注册全部 (消息, 处理器) 对；
//! 4. 运行期经 `MessageBroker`（或 `BrokerContext`）发布与请求。
//!
pub mod broker;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod handle;
pub mod publisher;
pub mod request;
pub mod scope;
pub mod subscriptions;

pub use broker::{AsyncDispatch, BrokerConfig, EventBroker, MessageBroker, RequestBroker};
pub use context::BrokerContext;
pub use dispatch::{Facet, RequestFacet};
pub use error::{BrokerError, BrokerResult};
pub use event::{
    AggregateChangedEvent, AggregateChangedEvents, AggregateCreatedEvent, AggregateCreatedEvents,
    AggregateEvent, AggregateEvents, AggregateId, AllEvents, DomainEvent,
};
pub use handle::{Handle, HandleAsync, HandleRequest, HandleRequestAsync, HandlerType};
pub use publisher::{PublishesDomainEvents, inject_publisher};
pub use request::{DomainRequest, RequestsAnswering};
pub use scope::{FactoryScope, HandlerScope, ScopeBehaviour};
pub use subscriptions::SubscriptionSet;
