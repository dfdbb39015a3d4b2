//! 处理器能力边界
//!
//! 同一消息可同时存在同步与异步两类处理器；一个处理器类型若同时实现
//! 两种能力并分别订阅，则两者都会被触发。
//!
use crate::error::BrokerResult;
use crate::request::DomainRequest;
use async_trait::async_trait;
use std::any::{Any, TypeId, type_name};

/// 同步事件处理器：处理消息 `M`（具体事件类型或切面视图）
pub trait Handle<M: ?Sized>: Send + Sync {
    fn handle(&self, message: &M) -> BrokerResult<()>;
}

/// 异步事件处理器
#[async_trait]
pub trait HandleAsync<M: ?Sized>: Send + Sync {
    async fn handle_async(&self, message: &M) -> BrokerResult<()>;
}

/// 同步请求处理器：返回 `None` 表示“本处理器无应答”，与失败（`Err`）互不混淆
pub trait HandleRequest<R: DomainRequest + ?Sized>: Send + Sync {
    fn handle(&self, request: &R) -> BrokerResult<Option<R::Response>>;
}

/// 异步请求处理器
#[async_trait]
pub trait HandleRequestAsync<R: DomainRequest + ?Sized>: Send + Sync {
    async fn handle_async(&self, request: &R) -> BrokerResult<Option<R::Response>>;
}

/// 处理器类型标识：经纪人交给解析器用于实例化的最小信息
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerType {
    pub id: TypeId,
    pub name: &'static str,
}

impl HandlerType {
    pub fn of<H: 'static>() -> Self {
        Self {
            id: TypeId::of::<H>(),
            name: type_name::<H>(),
        }
    }
}

/// 从作用域解析出 `H` 的实例并还原为具体类型
pub(crate) fn resolve_handler<H: 'static>(
    scope: &dyn crate::scope::HandlerScope,
) -> BrokerResult<Box<H>> {
    let handler_type = HandlerType::of::<H>();
    let instance = scope.resolve(&handler_type)?;

    instance
        .downcast::<H>()
        .map_err(|_| crate::error::BrokerError::TypeMismatch {
            expected: handler_type.name,
            found: "unknown",
        })
}

/// 方便识别的类型擦除载荷别名
pub(crate) type BoxAnySend = Box<dyn Any + Send>;
