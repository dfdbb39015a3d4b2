//! 领域事件能力边界
//!
//! `DomainEvent` 是事件角色的能力标记；`AggregateEvent` 在其上附加所属
//! 聚合的类型名与标识，*created*/*changed* 两种风味仅以标记区分，结构
//! 完全一致。事件通过 `facets` 声明自己参与分发的切面视图（接口键），
//! 切面键上的处理器先于具体类型键上的处理器被触发。
//!
use crate::dispatch::Facet;
use std::any::Any;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// 领域事件能力标记
///
/// 除类型身份外不要求任何字段；`facets` 默认返回空表，表示该事件只按
/// 具体类型分发（全量切面 [`AllEvents`] 由经纪人自动补充）。
pub trait DomainEvent: Any + Send + Sync + 'static {
    /// 事件类型名（诊断与日志用，重构稳定）
    fn event_type(&self) -> &'static str;

    /// 向下转型入口
    fn as_any(&self) -> &dyn Any;

    /// 该事件声明的切面视图，按声明顺序分发
    fn facets(&self) -> Vec<Facet<'_>> {
        Vec::new()
    }
}

/// 聚合标识需要满足的能力：值相等、可散列、可跨线程
pub trait AggregateId: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> AggregateId for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// 聚合事件：携带所属聚合的类型名与标识
pub trait AggregateEvent: DomainEvent {
    type Id: AggregateId;

    /// 所属聚合的类型名
    fn aggregate_type(&self) -> &'static str;

    /// 所属聚合的标识（值语义）
    fn aggregate_id(&self) -> Self::Id;

    /// 以共享所有权复制自身；事件存储接收引用时以此取得所有权
    fn clone_event(&self) -> Arc<dyn AggregateEvent<Id = Self::Id>>;
}

/// “聚合已创建”风味标记
pub trait AggregateCreatedEvent: AggregateEvent {}

/// “聚合已变更”风味标记
pub trait AggregateChangedEvent: AggregateEvent {}

/// 全量切面：订阅该键即可收到任意领域事件
pub type AllEvents = dyn DomainEvent;

/// 切面别名：标识类型为 `I` 的全部聚合事件
pub type AggregateEvents<I> = dyn AggregateEvent<Id = I>;

/// 切面别名：标识类型为 `I` 的全部“已创建”事件
pub type AggregateCreatedEvents<I> = dyn AggregateCreatedEvent<Id = I>;

/// 切面别名：标识类型为 `I` 的全部“已变更”事件
pub type AggregateChangedEvents<I> = dyn AggregateChangedEvent<Id = I>;
