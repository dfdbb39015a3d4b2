//! 类型擦除分发基建
//!
//! 订阅时为每个 (消息键, 处理器) 生成一次性的调用闭包（invoker），
//! 发布时由消息给出的切面视图（`Facet`/`RequestFacet`）将擦除的
//! invoker 还原为带类型的调用 —— 即“注册期构建分发表”的实现。
//!
//! 一个切面视图把消息以某个视图类型 `M`（trait 对象或具体类型本身）
//! 暴露给按该键注册的处理器；具体类型分发只是 `M = 具体类型` 的退化
//! 情形，由经纪人在视图序列末尾自动补上。
//!
use crate::error::{BrokerError, BrokerResult};
use crate::handle::BoxAnySend;
use crate::scope::HandlerScope;
use futures_core::future::BoxFuture;
use std::any::{Any, TypeId, type_name};
use std::future::ready;

pub(crate) type SyncEventFn<M> =
    Box<dyn for<'s> Fn(&'s dyn HandlerScope, &'s M) -> BrokerResult<()> + Send + Sync>;

pub(crate) type AsyncEventFn<M> = Box<
    dyn for<'s> Fn(&'s dyn HandlerScope, &'s M) -> BoxFuture<'s, BrokerResult<()>> + Send + Sync,
>;

pub(crate) type SyncRequestFn<M> = Box<
    dyn for<'s> Fn(&'s dyn HandlerScope, &'s M) -> BrokerResult<Option<BoxAnySend>> + Send + Sync,
>;

pub(crate) type AsyncRequestFn<M> = Box<
    dyn for<'s> Fn(&'s dyn HandlerScope, &'s M) -> BoxFuture<'s, BrokerResult<Option<BoxAnySend>>>
        + Send
        + Sync,
>;

pub(crate) struct SyncEventInvoker<M: ?Sized + 'static> {
    pub(crate) call: SyncEventFn<M>,
}

pub(crate) struct AsyncEventInvoker<M: ?Sized + 'static> {
    pub(crate) call: AsyncEventFn<M>,
}

pub(crate) struct SyncRequestInvoker<M: ?Sized + 'static> {
    pub(crate) call: SyncRequestFn<M>,
}

pub(crate) struct AsyncRequestInvoker<M: ?Sized + 'static> {
    pub(crate) call: AsyncRequestFn<M>,
}

fn invoker_mismatch<M: ?Sized>() -> BrokerError {
    // 仅当注册表被绕过类型化订阅入口污染时才可能出现
    BrokerError::TypeMismatch {
        expected: type_name::<M>(),
        found: "unknown",
    }
}

trait EventViewApply: Send + Sync {
    fn key(&self) -> TypeId;

    fn view_name(&self) -> &'static str;

    fn apply_sync(
        &self,
        invoker: &(dyn Any + Send + Sync),
        scope: &dyn HandlerScope,
    ) -> BrokerResult<()>;

    fn apply_async<'a>(
        &'a self,
        invoker: &'a (dyn Any + Send + Sync),
        scope: &'a dyn HandlerScope,
    ) -> BoxFuture<'a, BrokerResult<()>>;
}

struct TypedEventView<'e, M: ?Sized + 'static> {
    view: &'e M,
}

impl<M: ?Sized + Sync + 'static> EventViewApply for TypedEventView<'_, M> {
    fn key(&self) -> TypeId {
        TypeId::of::<M>()
    }

    fn view_name(&self) -> &'static str {
        type_name::<M>()
    }

    fn apply_sync(
        &self,
        invoker: &(dyn Any + Send + Sync),
        scope: &dyn HandlerScope,
    ) -> BrokerResult<()> {
        let Some(invoker) = invoker.downcast_ref::<SyncEventInvoker<M>>() else {
            return Err(invoker_mismatch::<M>());
        };

        (invoker.call)(scope, self.view)
    }

    fn apply_async<'a>(
        &'a self,
        invoker: &'a (dyn Any + Send + Sync),
        scope: &'a dyn HandlerScope,
    ) -> BoxFuture<'a, BrokerResult<()>> {
        match invoker.downcast_ref::<AsyncEventInvoker<M>>() {
            Some(invoker) => (invoker.call)(scope, self.view),
            None => Box::pin(ready(Err(invoker_mismatch::<M>()))),
        }
    }
}

/// 事件的一个切面视图：以视图类型 `M` 的身份参与分发
pub struct Facet<'e> {
    inner: Box<dyn EventViewApply + 'e>,
}

impl<'e> Facet<'e> {
    /// 以视图类型 `M` 包装事件引用；`M` 通常是
    /// `dyn AggregateEvent<Id = ...>` 这样的 trait 对象类型
    pub fn of<M: ?Sized + Sync + 'static>(view: &'e M) -> Self {
        Self {
            inner: Box::new(TypedEventView { view }),
        }
    }

    pub(crate) fn key(&self) -> TypeId {
        self.inner.key()
    }

    pub(crate) fn view_name(&self) -> &'static str {
        self.inner.view_name()
    }

    pub(crate) fn apply_sync(
        &self,
        invoker: &(dyn Any + Send + Sync),
        scope: &dyn HandlerScope,
    ) -> BrokerResult<()> {
        self.inner.apply_sync(invoker, scope)
    }

    pub(crate) async fn apply_async(
        &self,
        invoker: &(dyn Any + Send + Sync),
        scope: &dyn HandlerScope,
    ) -> BrokerResult<()> {
        self.inner.apply_async(invoker, scope).await
    }
}

trait RequestViewApply: Send + Sync {
    fn key(&self) -> TypeId;

    fn view_name(&self) -> &'static str;

    fn apply_sync(
        &self,
        invoker: &(dyn Any + Send + Sync),
        scope: &dyn HandlerScope,
    ) -> BrokerResult<Option<BoxAnySend>>;

    fn apply_async<'a>(
        &'a self,
        invoker: &'a (dyn Any + Send + Sync),
        scope: &'a dyn HandlerScope,
    ) -> BoxFuture<'a, BrokerResult<Option<BoxAnySend>>>;
}

struct TypedRequestView<'r, M: ?Sized + 'static> {
    view: &'r M,
}

impl<M: ?Sized + Sync + 'static> RequestViewApply for TypedRequestView<'_, M> {
    fn key(&self) -> TypeId {
        TypeId::of::<M>()
    }

    fn view_name(&self) -> &'static str {
        type_name::<M>()
    }

    fn apply_sync(
        &self,
        invoker: &(dyn Any + Send + Sync),
        scope: &dyn HandlerScope,
    ) -> BrokerResult<Option<BoxAnySend>> {
        let Some(invoker) = invoker.downcast_ref::<SyncRequestInvoker<M>>() else {
            return Err(invoker_mismatch::<M>());
        };

        (invoker.call)(scope, self.view)
    }

    fn apply_async<'a>(
        &'a self,
        invoker: &'a (dyn Any + Send + Sync),
        scope: &'a dyn HandlerScope,
    ) -> BoxFuture<'a, BrokerResult<Option<BoxAnySend>>> {
        match invoker.downcast_ref::<AsyncRequestInvoker<M>>() {
            Some(invoker) => (invoker.call)(scope, self.view),
            None => Box::pin(ready(Err(invoker_mismatch::<M>()))),
        }
    }
}

/// 请求的一个切面视图；与 [`Facet`] 对应，但调用产物是可选应答
pub struct RequestFacet<'r> {
    inner: Box<dyn RequestViewApply + 'r>,
}

impl<'r> RequestFacet<'r> {
    pub fn of<M: ?Sized + Sync + 'static>(view: &'r M) -> Self {
        Self {
            inner: Box::new(TypedRequestView { view }),
        }
    }

    pub(crate) fn key(&self) -> TypeId {
        self.inner.key()
    }

    pub(crate) fn view_name(&self) -> &'static str {
        self.inner.view_name()
    }

    pub(crate) fn apply_sync(
        &self,
        invoker: &(dyn Any + Send + Sync),
        scope: &dyn HandlerScope,
    ) -> BrokerResult<Option<BoxAnySend>> {
        self.inner.apply_sync(invoker, scope)
    }

    pub(crate) async fn apply_async(
        &self,
        invoker: &(dyn Any + Send + Sync),
        scope: &dyn HandlerScope,
    ) -> BrokerResult<Option<BoxAnySend>> {
        self.inner.apply_async(invoker, scope).await
    }
}
