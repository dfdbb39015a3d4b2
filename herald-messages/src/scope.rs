//! 处理器构造作用域（Scope）
//!
//! 分发调用通过作用域实例化处理器；作用域的创建策略由 `ScopeBehaviour`
//! 决定，释放依赖 RAII（`Drop`），因此无论成功、失败还是提前返回，
//! 子作用域都会在对应分发片段结束时释放。
//!
use crate::error::{BrokerError, BrokerResult};
use crate::handle::HandlerType;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 分发调用的子作用域创建策略（每个经纪人实例配置一次）
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScopeBehaviour {
    /// 全部处理器直接使用经纪人持有的根作用域
    #[default]
    NoChildScopes,
    /// 每次分发调用创建一个子作用域，调用结束时释放
    ChildScopePerMessage,
    /// 每个处理器单独创建一个子作用域，该处理器完成后立即释放
    ChildScopePerHandler,
}

/// 解析器协作方边界：构造作用域与在其中实例化处理器
///
/// `tag` 是作用域身份，处理器工厂可在构造时观察它；
/// `create_child` 返回的 `Box` 被丢弃即视为释放。
pub trait HandlerScope: Send + Sync {
    fn tag(&self) -> u64;

    fn create_child(&self) -> BrokerResult<Box<dyn HandlerScope>>;

    fn resolve(&self, handler: &HandlerType) -> BrokerResult<Box<dyn Any + Send>>;
}

type HandlerFactory = Arc<dyn Fn(&dyn HandlerScope) -> Box<dyn Any + Send> + Send + Sync>;

static NEXT_TAG: AtomicU64 = AtomicU64::new(1);

fn next_tag() -> u64 {
    NEXT_TAG.fetch_add(1, Ordering::Relaxed)
}

/// 基于工厂注册表的内置作用域实现
/// - 通过 TypeId 注册不同处理器类型对应的工厂
/// - 子作用域共享工厂表，但持有全新的 `tag`
pub struct FactoryScope {
    factories: Arc<DashMap<TypeId, HandlerFactory>>,
    tag: u64,
}

impl Default for FactoryScope {
    fn default() -> Self {
        Self {
            factories: Arc::new(DashMap::new()),
            tag: next_tag(),
        }
    }
}

impl FactoryScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册处理器工厂；工厂收到的是处理器将被构造于其中的那个作用域
    pub fn register<H>(&self, factory: impl Fn(&dyn HandlerScope) -> H + Send + Sync + 'static)
    where
        H: Send + 'static,
    {
        let factory: HandlerFactory = Arc::new(move |scope| Box::new(factory(scope)));
        self.factories.insert(TypeId::of::<H>(), factory);
    }
}

impl HandlerScope for FactoryScope {
    fn tag(&self) -> u64 {
        self.tag
    }

    fn create_child(&self) -> BrokerResult<Box<dyn HandlerScope>> {
        Ok(Box::new(Self {
            factories: Arc::clone(&self.factories),
            tag: next_tag(),
        }))
    }

    fn resolve(&self, handler: &HandlerType) -> BrokerResult<Box<dyn Any + Send>> {
        let Some(factory) = self.factories.get(&handler.id).map(|f| f.clone()) else {
            return Err(BrokerError::Resolve {
                handler: handler.name,
                reason: "no factory registered for handler type".into(),
            });
        };

        Ok(factory(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        seen_tag: u64,
    }

    #[test]
    fn resolve_constructs_from_registered_factory() {
        let scope = FactoryScope::new();
        scope.register(|s| Probe { seen_tag: s.tag() });

        let instance = scope.resolve(&HandlerType::of::<Probe>()).unwrap();
        let probe = instance.downcast::<Probe>().unwrap();

        assert_eq!(probe.seen_tag, scope.tag());
    }

    #[test]
    fn resolve_unregistered_type_fails() {
        let scope = FactoryScope::new();

        let err = scope.resolve(&HandlerType::of::<Probe>()).unwrap_err();
        assert!(matches!(err, BrokerError::Resolve { .. }));
    }

    #[test]
    fn child_scope_shares_factories_with_fresh_tag() {
        let scope = FactoryScope::new();
        scope.register(|s| Probe { seen_tag: s.tag() });

        let child = scope.create_child().unwrap();
        assert_ne!(child.tag(), scope.tag());

        let instance = child.resolve(&HandlerType::of::<Probe>()).unwrap();
        let probe = instance.downcast::<Probe>().unwrap();
        assert_eq!(probe.seen_tag, child.tag());
    }

    #[test]
    fn tags_are_unique_across_scopes() {
        let a = FactoryScope::new();
        let b = FactoryScope::new();
        let child = a.create_child().unwrap();

        assert_ne!(a.tag(), b.tag());
        assert_ne!(a.tag(), child.tag());
        assert_ne!(b.tag(), child.tag());
    }
}
