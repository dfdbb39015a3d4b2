//! 聚合（Aggregate）抽象与重放分发表
//!
//! 聚合是瞬态的：每次读取都从零值（`Default`）出发，把存储的事件序列
//! 按序折叠回当前状态。折叠按事件的*运行时*具体类型路由到对应的
//! [`Apply`] 实现 —— 路由表在 [`Aggregate::applier`] 中一次性登记，
//! 折叠时只做一次哈希查找与一次向下转型。
//!
use crate::error::{EventSourcingError, EventSourcingResult};
use herald_messages::{AggregateEvent, AggregateId, DomainEvent};
use std::any::TypeId;
use std::collections::HashMap;

/// 事件溯源聚合
pub trait Aggregate: Default + Send + Sync + 'static {
    /// 聚合类型名（事件上的 `aggregate_type` 即此值）
    const TYPE: &'static str;

    /// 聚合标识类型
    type Id: AggregateId;

    /// 登记该聚合处理的全部事件类型
    fn applier() -> EventApplier<Self>;
}

/// 将某个具体事件类型投影到聚合状态
pub trait Apply<E> {
    fn apply(&mut self, event: &E);
}

type ApplyFn<A> = Box<dyn Fn(&mut A, &dyn std::any::Any) + Send + Sync>;

/// 按具体事件类型键控的重放分发表
pub struct EventApplier<A> {
    table: HashMap<TypeId, ApplyFn<A>>,
}

impl<A: Aggregate> Default for EventApplier<A> {
    fn default() -> Self {
        Self {
            table: HashMap::new(),
        }
    }
}

impl<A: Aggregate> EventApplier<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记事件类型 `E` 的折叠入口
    pub fn on<E>(mut self) -> Self
    where
        E: AggregateEvent<Id = A::Id>,
        A: Apply<E>,
    {
        self.table.insert(
            TypeId::of::<E>(),
            Box::new(|aggregate, event| {
                if let Some(event) = event.downcast_ref::<E>() {
                    aggregate.apply(event);
                }
            }),
        );
        self
    }

    /// 以事件的运行时类型路由一次折叠；未登记的事件类型是错误
    pub fn apply_dyn(
        &self,
        aggregate: &mut A,
        event: &dyn AggregateEvent<Id = A::Id>,
    ) -> EventSourcingResult<()> {
        let any = event.as_any();

        match self.table.get(&any.type_id()) {
            Some(apply) => {
                apply(aggregate, any);
                Ok(())
            }
            None => Err(EventSourcingError::UnhandledEvent {
                aggregate: A::TYPE,
                event_type: event.event_type(),
            }),
        }
    }

    pub fn handles(&self, event_type: TypeId) -> bool {
        self.table.contains_key(&event_type)
    }
}
