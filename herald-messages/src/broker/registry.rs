//! 订阅注册表
//!
//! 消息键（TypeId）→ 插入有序的调用器列表。重复订阅被保留并都会触发；
//! 不存在注销操作，注册表随经纪人存续。分发侧在触发前把列表克隆出来，
//! 注册冻结后读取即无锁。
//!
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct Registration {
    /// 处理器类型名（诊断用）
    pub(crate) handler: &'static str,
    /// 类型擦除的调用器，由切面视图还原
    pub(crate) invoker: Arc<dyn Any + Send + Sync>,
}

#[derive(Default)]
pub(crate) struct Registry {
    table: DashMap<TypeId, Vec<Registration>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, key: TypeId, registration: Registration) {
        self.table.entry(key).or_default().push(registration);
    }

    /// 某个消息键下的全部注册，按订阅顺序
    pub(crate) fn get(&self, key: TypeId) -> Vec<Registration> {
        self.table.get(&key).map(|r| r.clone()).unwrap_or_default()
    }

    pub(crate) fn len(&self) -> usize {
        self.table.iter().map(|r| r.len()).sum()
    }
}
