//! 事件经纪人（EventBroker）
//!
//! 发布即按序触发订阅者：先全部同步处理器、后全部异步处理器，两段内部
//! 均按“切面键在前、具体类型键在后，同键按订阅顺序”的规则排列。处理器
//! 之间没有失败隔离 —— 第一个失败会中止本次分发剩余的处理器并原样传播
//! 给发布方，事件副作用是否完成必须让调用方可见。
//!
use crate::broker::registry::{Registration, Registry};
use crate::dispatch::{AsyncEventFn, AsyncEventInvoker, Facet, SyncEventFn, SyncEventInvoker};
use crate::error::BrokerResult;
use crate::event::{AllEvents, DomainEvent};
use crate::handle::{Handle, HandleAsync, resolve_handler};
use crate::scope::{HandlerScope, ScopeBehaviour};
use std::any::{TypeId, type_name};
use std::sync::Arc;

/// 异步段的完成语义（历史上两种实现各取其一，这里作为显式配置）
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AsyncDispatch {
    /// 发布在全部异步处理器完成后才算完成（默认）
    #[default]
    Awaited,
    /// 同步段内联执行，异步段转入后台任务；其中的失败仅记录日志
    Detached,
}

/// 事件经纪人：类型定向的进程内发布/订阅
#[derive(Clone)]
pub struct EventBroker {
    scope: Arc<dyn HandlerScope>,
    behaviour: ScopeBehaviour,
    async_dispatch: AsyncDispatch,
    sync_handlers: Arc<Registry>,
    async_handlers: Arc<Registry>,
}

impl EventBroker {
    pub fn new(
        scope: Arc<dyn HandlerScope>,
        behaviour: ScopeBehaviour,
        async_dispatch: AsyncDispatch,
    ) -> Self {
        Self {
            scope,
            behaviour,
            async_dispatch,
            sync_handlers: Arc::new(Registry::new()),
            async_handlers: Arc::new(Registry::new()),
        }
    }

    /// 订阅同步处理器；`M` 为具体事件类型或切面视图类型
    ///
    /// 重复订阅同一对 (消息, 处理器) 不是错误，两次都会触发。
    pub fn subscribe<M, H>(&self)
    where
        M: DomainEvent + ?Sized,
        H: Handle<M> + 'static,
    {
        let call: SyncEventFn<M> = Box::new(|scope, message| {
            let handler = resolve_handler::<H>(scope)?;
            handler.handle(message)
        });

        self.sync_handlers.push(
            TypeId::of::<M>(),
            Registration {
                handler: type_name::<H>(),
                invoker: Arc::new(SyncEventInvoker { call }),
            },
        );
    }

    /// 订阅异步处理器
    pub fn subscribe_async<M, H>(&self)
    where
        M: DomainEvent + ?Sized,
        H: HandleAsync<M> + 'static,
    {
        let call: AsyncEventFn<M> = Box::new(|scope, message| {
            let resolved = resolve_handler::<H>(scope);

            Box::pin(async move {
                let handler = resolved?;
                handler.handle_async(message).await
            })
        });

        self.async_handlers.push(
            TypeId::of::<M>(),
            Registration {
                handler: type_name::<H>(),
                invoker: Arc::new(AsyncEventInvoker { call }),
            },
        );
    }

    /// 发布事件；零订阅者时为空操作成功
    pub async fn publish<E: DomainEvent>(&self, event: E) -> BrokerResult<()> {
        let call_scope = match self.behaviour {
            ScopeBehaviour::ChildScopePerMessage => Some(self.scope.create_child()?),
            _ => None,
        };

        self.drain_sync(&event, call_scope.as_deref())?;

        match self.async_dispatch {
            AsyncDispatch::Awaited => self.drain_async(&event, call_scope.as_deref()).await,
            AsyncDispatch::Detached => {
                let broker = self.clone();

                tokio::spawn(async move {
                    // call_scope 随任务存活，异步段仍在本次分发的作用域内执行
                    if let Err(error) = broker.drain_async(&event, call_scope.as_deref()).await {
                        tracing::warn!(
                            %error,
                            event_type = event.event_type(),
                            "detached async dispatch aborted"
                        );
                    }
                });

                Ok(())
            }
        }
    }

    fn drain_sync<E: DomainEvent>(
        &self,
        event: &E,
        call_scope: Option<&dyn HandlerScope>,
    ) -> BrokerResult<()> {
        let scope = call_scope.unwrap_or_else(|| self.scope.as_ref());

        for view in &event_views(event) {
            for registration in self.sync_handlers.get(view.key()) {
                tracing::debug!(
                    view = view.view_name(),
                    handler = registration.handler,
                    "dispatching sync event handler"
                );

                if self.behaviour == ScopeBehaviour::ChildScopePerHandler {
                    let child = self.scope.create_child()?;
                    view.apply_sync(registration.invoker.as_ref(), child.as_ref())?;
                } else {
                    view.apply_sync(registration.invoker.as_ref(), scope)?;
                }
            }
        }

        Ok(())
    }

    async fn drain_async<E: DomainEvent>(
        &self,
        event: &E,
        call_scope: Option<&dyn HandlerScope>,
    ) -> BrokerResult<()> {
        let scope = call_scope.unwrap_or_else(|| self.scope.as_ref());
        let views = event_views(event);

        for view in &views {
            for registration in self.async_handlers.get(view.key()) {
                tracing::debug!(
                    view = view.view_name(),
                    handler = registration.handler,
                    "dispatching async event handler"
                );

                if self.behaviour == ScopeBehaviour::ChildScopePerHandler {
                    let child = self.scope.create_child()?;
                    view.apply_async(registration.invoker.as_ref(), child.as_ref())
                        .await?;
                } else {
                    view.apply_async(registration.invoker.as_ref(), scope)
                        .await?;
                }
            }
        }

        Ok(())
    }

    pub(crate) fn handler_count(&self) -> usize {
        self.sync_handlers.len() + self.async_handlers.len()
    }
}

/// 解析顺序：事件声明的切面 → 全量切面 → 具体类型，按键去重（保留首次出现）
fn event_views<E: DomainEvent>(event: &E) -> Vec<Facet<'_>> {
    let mut views = event.facets();
    views.push(Facet::of::<AllEvents>(event));
    views.push(Facet::of::<E>(event));

    let mut seen: Vec<TypeId> = Vec::with_capacity(views.len());
    views.retain(|view| {
        if seen.contains(&view.key()) {
            false
        } else {
            seen.push(view.key());
            true
        }
    });

    views
}
