//! 事件存储（EventStore）
//!
//! 纯内存、只追加的按聚合事件日志：外层按“标识类型”分桶，内层按标识的
//! 值相等查找，序列保持追加顺序，从不修改或截断。查询未知标识返回空
//! 序列而非错误。不承诺崩溃持久性 —— 存储随进程存续。
//!
use dashmap::DashMap;
use herald_messages::{AggregateEvent, AggregateId, DomainEvent};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type Stream<I> = HashMap<I, Vec<Arc<dyn AggregateEvent<Id = I>>>>;

/// 按 (标识类型, 标识值) 组织的只追加事件日志
#[derive(Default)]
pub struct EventStore {
    streams: DashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加单个事件
    pub fn store<E: AggregateEvent>(&self, event: E) {
        self.store_batch::<E::Id>([Arc::new(event) as Arc<dyn AggregateEvent<Id = E::Id>>]);
    }

    /// 按输入顺序追加一批事件（批内可混合不同具体事件类型）
    pub fn store_batch<I: AggregateId>(
        &self,
        events: impl IntoIterator<Item = Arc<dyn AggregateEvent<Id = I>>>,
    ) {
        let mut bucket = self
            .streams
            .entry(TypeId::of::<I>())
            .or_insert_with(|| Box::new(Stream::<I>::new()));
        let Some(stream) = bucket.downcast_mut::<Stream<I>>() else {
            // 桶按 TypeId::of::<I>() 建立，类型不可能错位
            return;
        };

        for event in events {
            tracing::debug!(
                aggregate_type = event.aggregate_type(),
                event_type = event.event_type(),
                "storing aggregate event"
            );
            stream.entry(event.aggregate_id()).or_default().push(event);
        }
    }

    /// 某个聚合标识下的事件序列（追加顺序）；未知标识返回空序列
    pub fn get<I: AggregateId>(&self, id: &I) -> Vec<Arc<dyn AggregateEvent<Id = I>>> {
        self.streams
            .get(&TypeId::of::<I>())
            .and_then(|bucket| {
                bucket
                    .downcast_ref::<Stream<I>>()
                    .and_then(|stream| stream.get(id).cloned())
            })
            .unwrap_or_default()
    }
}
