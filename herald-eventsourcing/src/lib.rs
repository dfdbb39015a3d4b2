//! 事件溯源核心（herald-eventsourcing）
//!
//! 在 herald-messages 的事件模型之上提供：
//! - 事件存储（`store`）：内存态、只追加的按聚合事件日志；
//! - 聚合抽象（`aggregate`）：零值 + 折叠的重建模型与重放分发表；
//! - 仓储（`repository`）：读取即重放，且可作为处理器订阅聚合事件切面，
//!   让“发布即持久化”。
//!
pub mod aggregate;
pub mod error;
pub mod repository;
pub mod store;

pub use aggregate::{Aggregate, Apply, EventApplier};
pub use error::{EventSourcingError, EventSourcingResult};
pub use repository::EventSourcedRepository;
pub use store::EventStore;
