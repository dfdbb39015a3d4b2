//! 请求经纪人（RequestBroker）
//!
//! 单胜者模式（`request`）：同步处理器按序询问，第一个给出应答即返回，
//! 同步应答永远优先于任何异步应答；多播模式（`multicast_request`）：
//! 所有处理器都被询问，全部非空应答按“同步在前”的顺序收集返回。
//!
use crate::broker::registry::{Registration, Registry};
use crate::dispatch::{
    AsyncRequestFn, AsyncRequestInvoker, RequestFacet, SyncRequestFn, SyncRequestInvoker,
};
use crate::error::{BrokerError, BrokerResult};
use crate::handle::{BoxAnySend, HandleRequest, HandleRequestAsync, resolve_handler};
use crate::request::DomainRequest;
use crate::scope::{HandlerScope, ScopeBehaviour};
use std::any::{TypeId, type_name};
use std::sync::Arc;

/// 请求经纪人：单胜者与多播两种请求/应答分发
#[derive(Clone)]
pub struct RequestBroker {
    scope: Arc<dyn HandlerScope>,
    behaviour: ScopeBehaviour,
    sync_handlers: Arc<Registry>,
    async_handlers: Arc<Registry>,
}

impl RequestBroker {
    pub fn new(scope: Arc<dyn HandlerScope>, behaviour: ScopeBehaviour) -> Self {
        Self {
            scope,
            behaviour,
            sync_handlers: Arc::new(Registry::new()),
            async_handlers: Arc::new(Registry::new()),
        }
    }

    /// 订阅同步请求处理器；`R` 为具体请求类型或切面视图类型
    pub fn subscribe<R, H>(&self)
    where
        R: DomainRequest + ?Sized,
        H: HandleRequest<R> + 'static,
    {
        let call: SyncRequestFn<R> = Box::new(|scope, request| {
            let handler = resolve_handler::<H>(scope)?;
            let response = handler.handle(request)?;
            Ok(response.map(|response| Box::new(response) as BoxAnySend))
        });

        self.sync_handlers.push(
            TypeId::of::<R>(),
            Registration {
                handler: type_name::<H>(),
                invoker: Arc::new(SyncRequestInvoker { call }),
            },
        );
    }

    /// 订阅异步请求处理器
    pub fn subscribe_async<R, H>(&self)
    where
        R: DomainRequest + ?Sized,
        H: HandleRequestAsync<R> + 'static,
    {
        let call: AsyncRequestFn<R> = Box::new(|scope, request| {
            let resolved = resolve_handler::<H>(scope);

            Box::pin(async move {
                let handler = resolved?;
                let response = handler.handle_async(request).await?;
                Ok(response.map(|response| Box::new(response) as BoxAnySend))
            })
        });

        self.async_handlers.push(
            TypeId::of::<R>(),
            Registration {
                handler: type_name::<H>(),
                invoker: Arc::new(AsyncRequestInvoker { call }),
            },
        );
    }

    /// 单胜者请求：第一个非空应答立即返回；无人应答返回 `None`
    pub async fn request<R: DomainRequest>(
        &self,
        request: R,
    ) -> BrokerResult<Option<R::Response>> {
        let call_scope = match self.behaviour {
            ScopeBehaviour::ChildScopePerMessage => Some(self.scope.create_child()?),
            _ => None,
        };
        let scope = call_scope.as_deref().unwrap_or_else(|| self.scope.as_ref());
        let views = request_views(&request);

        for view in &views {
            for registration in self.sync_handlers.get(view.key()) {
                if let Some(boxed) = self.run_sync(view, &registration, scope)? {
                    return downcast_response::<R>(boxed).map(Some);
                }
            }
        }

        for view in &views {
            for registration in self.async_handlers.get(view.key()) {
                if let Some(boxed) = self.run_async(view, &registration, scope).await? {
                    return downcast_response::<R>(boxed).map(Some);
                }
            }
        }

        Ok(None)
    }

    /// 多播请求：收集全部非空应答（同步应答在前，各段按订阅顺序）
    pub async fn multicast_request<R: DomainRequest>(
        &self,
        request: R,
    ) -> BrokerResult<Vec<R::Response>> {
        let call_scope = match self.behaviour {
            ScopeBehaviour::ChildScopePerMessage => Some(self.scope.create_child()?),
            _ => None,
        };
        let scope = call_scope.as_deref().unwrap_or_else(|| self.scope.as_ref());
        let views = request_views(&request);
        let mut responses = Vec::new();

        for view in &views {
            for registration in self.sync_handlers.get(view.key()) {
                if let Some(boxed) = self.run_sync(view, &registration, scope)? {
                    responses.push(downcast_response::<R>(boxed)?);
                }
            }
        }

        for view in &views {
            for registration in self.async_handlers.get(view.key()) {
                if let Some(boxed) = self.run_async(view, &registration, scope).await? {
                    responses.push(downcast_response::<R>(boxed)?);
                }
            }
        }

        Ok(responses)
    }

    fn run_sync(
        &self,
        view: &RequestFacet<'_>,
        registration: &Registration,
        scope: &dyn HandlerScope,
    ) -> BrokerResult<Option<BoxAnySend>> {
        tracing::debug!(
            view = view.view_name(),
            handler = registration.handler,
            "dispatching sync request handler"
        );

        if self.behaviour == ScopeBehaviour::ChildScopePerHandler {
            let child = self.scope.create_child()?;
            view.apply_sync(registration.invoker.as_ref(), child.as_ref())
        } else {
            view.apply_sync(registration.invoker.as_ref(), scope)
        }
    }

    async fn run_async(
        &self,
        view: &RequestFacet<'_>,
        registration: &Registration,
        scope: &dyn HandlerScope,
    ) -> BrokerResult<Option<BoxAnySend>> {
        tracing::debug!(
            view = view.view_name(),
            handler = registration.handler,
            "dispatching async request handler"
        );

        if self.behaviour == ScopeBehaviour::ChildScopePerHandler {
            let child = self.scope.create_child()?;
            view.apply_async(registration.invoker.as_ref(), child.as_ref())
                .await
        } else {
            view.apply_async(registration.invoker.as_ref(), scope).await
        }
    }
}

/// 解析顺序：请求声明的切面 → 具体类型，按键去重
fn request_views<R: DomainRequest>(request: &R) -> Vec<RequestFacet<'_>> {
    let mut views = request.facets();
    views.push(RequestFacet::of::<R>(request));

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

fn downcast_response<R: DomainRequest>(boxed: BoxAnySend) -> BrokerResult<R::Response> {
    boxed
        .downcast::<R::Response>()
        .map(|response| *response)
        .map_err(|_| BrokerError::TypeMismatch {
            expected: type_name::<R::Response>(),
            found: "unknown",
        })
}
