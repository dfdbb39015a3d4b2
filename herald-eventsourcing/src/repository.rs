//! 事件溯源仓储（EventSourcedRepository）
//!
//! 读取即重放：零值聚合 + 按序折叠该标识下的全部事件。仓储同时实现
//! `Handle<AggregateEvents<I>>`，订阅到聚合事件切面后，凡经经纪人发布
//! 的聚合事件都会被追加进事件存储 —— 发布与持久化共用一条通路。
//!
use crate::aggregate::Aggregate;
use crate::error::EventSourcingResult;
use crate::store::EventStore;
use herald_messages::{AggregateEvent, AggregateEvents, AggregateId, BrokerResult, Handle};
use std::marker::PhantomData;
use std::sync::Arc;

/// 标识类型为 `I` 的聚合仓储
pub struct EventSourcedRepository<I: AggregateId> {
    event_store: Arc<EventStore>,
    _id: PhantomData<fn() -> I>,
}

impl<I: AggregateId> EventSourcedRepository<I> {
    pub fn new(event_store: Arc<EventStore>) -> Self {
        Self {
            event_store,
            _id: PhantomData,
        }
    }

    /// 以折叠重建聚合；无历史时返回零值聚合
    pub fn get<A>(&self, id: &I) -> EventSourcingResult<A>
    where
        A: Aggregate<Id = I>,
    {
        let events = self.event_store.get::<I>(id);
        let applier = A::applier();
        let mut aggregate = A::default();

        for event in &events {
            applier.apply_dyn(&mut aggregate, event.as_ref())?;
        }

        Ok(aggregate)
    }

    pub fn event_store(&self) -> &Arc<EventStore> {
        &self.event_store
    }
}

impl<I: AggregateId> Handle<AggregateEvents<I>> for EventSourcedRepository<I> {
    fn handle(&self, event: &AggregateEvents<I>) -> BrokerResult<()> {
        self.event_store.store_batch([event.clone_event()]);
        Ok(())
    }
}
