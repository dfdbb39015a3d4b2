//! 发布者注入能力（物化钩子边界）
//!
//! 周边持久化层在物化出新对象后调用本能力，把经纪人句柄注入进去；
//! 核心只定义边界，不负责侦测物化。
//!
use crate::broker::MessageBroker;
use std::sync::Arc;

/// 可被注入发布者的对象能力
pub trait PublishesDomainEvents {
    fn set_publisher(&mut self, publisher: Arc<MessageBroker>);
}

/// 物化钩子：向目标注入经纪人句柄
pub fn inject_publisher(target: &mut dyn PublishesDomainEvents, broker: &Arc<MessageBroker>) {
    target.set_publisher(Arc::clone(broker));
}
