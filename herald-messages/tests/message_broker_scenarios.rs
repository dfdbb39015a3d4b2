use async_trait::async_trait;
use herald_messages::{
    AllEvents, BrokerError, BrokerResult, DomainEvent, DomainRequest, Facet, Handle, HandleAsync,
    HandleRequest, HandlerScope, HandlerType, MessageBroker, RequestFacet, RequestsAnswering,
    ScopeBehaviour,
};
use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

type Timeline = Arc<Mutex<Vec<String>>>;

static NEXT_TAG: AtomicU64 = AtomicU64::new(1);

fn next_tag() -> u64 {
    NEXT_TAG.fetch_add(1, Ordering::Relaxed)
}

/// 记录作用域创建/解析/释放时间线的测试作用域
struct SpyScope {
    tag: u64,
    timeline: Timeline,
    fail_handler: bool,
    record_self: bool,
}

impl SpyScope {
    fn root(timeline: Timeline, fail_handler: bool) -> Self {
        Self {
            tag: next_tag(),
            timeline,
            fail_handler,
            record_self: false,
        }
    }

    fn push(&self, entry: String) {
        self.timeline.lock().unwrap().push(entry);
    }
}

impl HandlerScope for SpyScope {
    fn tag(&self) -> u64 {
        self.tag
    }

    fn create_child(&self) -> BrokerResult<Box<dyn HandlerScope>> {
        let child = Self {
            tag: next_tag(),
            timeline: self.timeline.clone(),
            fail_handler: self.fail_handler,
            record_self: true,
        };
        self.push(format!("create {}", child.tag));
        Ok(Box::new(child))
    }

    fn resolve(&self, handler: &HandlerType) -> BrokerResult<Box<dyn Any + Send>> {
        self.push(format!("resolve {}", self.tag));

        if handler.id == TypeId::of::<TimelineHandler>() {
            Ok(Box::new(TimelineHandler {
                timeline: self.timeline.clone(),
                fail: self.fail_handler,
            }))
        } else if handler.id == TypeId::of::<TimelineAsyncHandler>() {
            Ok(Box::new(TimelineAsyncHandler {
                timeline: self.timeline.clone(),
            }))
        } else {
            Err(BrokerError::Resolve {
                handler: handler.name,
                reason: "unknown handler type in test scope".into(),
            })
        }
    }
}

impl Drop for SpyScope {
    fn drop(&mut self) {
        if self.record_self {
            self.push(format!("release {}", self.tag));
        }
    }
}

struct ScopedEvent;

impl DomainEvent for ScopedEvent {
    fn event_type(&self) -> &'static str {
        "ScopedEvent"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct TimelineHandler {
    timeline: Timeline,
    fail: bool,
}

impl Handle<ScopedEvent> for TimelineHandler {
    fn handle(&self, _event: &ScopedEvent) -> BrokerResult<()> {
        self.timeline.lock().unwrap().push("handle".into());
        if self.fail {
            return Err(BrokerError::EventHandler {
                handler: "timeline".into(),
                reason: "fail requested".into(),
            });
        }
        Ok(())
    }
}

struct TimelineAsyncHandler {
    timeline: Timeline,
}

#[async_trait]
impl HandleAsync<ScopedEvent> for TimelineAsyncHandler {
    async fn handle_async(&self, _event: &ScopedEvent) -> BrokerResult<()> {
        self.timeline.lock().unwrap().push("handle-async".into());
        Ok(())
    }
}

fn timeline_of(timeline: &Timeline) -> Vec<String> {
    timeline.lock().unwrap().clone()
}

#[tokio::test(flavor = "multi_thread")]
async fn no_child_scopes_resolves_from_the_root() {
    let timeline: Timeline = Arc::new(Mutex::new(Vec::new()));
    let root = SpyScope::root(timeline.clone(), false);
    let root_tag = root.tag();
    let broker = MessageBroker::new(Arc::new(root), ScopeBehaviour::NoChildScopes);

    broker.subscribe::<ScopedEvent, TimelineHandler>();
    broker.publish(ScopedEvent).await.unwrap();

    assert_eq!(
        timeline_of(&timeline),
        vec![format!("resolve {root_tag}"), "handle".to_string()]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn child_scope_per_message_wraps_the_whole_call() {
    let timeline: Timeline = Arc::new(Mutex::new(Vec::new()));
    let broker = MessageBroker::new(
        Arc::new(SpyScope::root(timeline.clone(), false)),
        ScopeBehaviour::ChildScopePerMessage,
    );

    broker.subscribe::<ScopedEvent, TimelineHandler>();
    broker.subscribe_async::<ScopedEvent, TimelineAsyncHandler>();
    broker.publish(ScopedEvent).await.unwrap();

    let entries = timeline_of(&timeline);
    // 一次 create，两次在同一子作用域内 resolve，调用结束后一次 release
    let child_tag = entries[0]
        .strip_prefix("create ")
        .expect("first entry is the child scope creation")
        .to_string();
    assert_eq!(
        entries,
        vec![
            format!("create {child_tag}"),
            format!("resolve {child_tag}"),
            "handle".to_string(),
            format!("resolve {child_tag}"),
            "handle-async".to_string(),
            format!("release {child_tag}"),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn child_scope_per_handler_releases_before_the_next_handler() {
    let timeline: Timeline = Arc::new(Mutex::new(Vec::new()));
    let broker = MessageBroker::new(
        Arc::new(SpyScope::root(timeline.clone(), false)),
        ScopeBehaviour::ChildScopePerHandler,
    );

    broker.subscribe::<ScopedEvent, TimelineHandler>();
    broker.subscribe::<ScopedEvent, TimelineHandler>();
    broker.publish(ScopedEvent).await.unwrap();

    let entries = timeline_of(&timeline);
    let first = entries[0].strip_prefix("create ").unwrap().to_string();
    let second = entries[4].strip_prefix("create ").unwrap().to_string();
    assert_ne!(first, second);
    assert_eq!(
        entries,
        vec![
            format!("create {first}"),
            format!("resolve {first}"),
            "handle".to_string(),
            format!("release {first}"),
            format!("create {second}"),
            format!("resolve {second}"),
            "handle".to_string(),
            format!("release {second}"),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_handler_still_releases_its_scope() {
    let timeline: Timeline = Arc::new(Mutex::new(Vec::new()));
    let broker = MessageBroker::new(
        Arc::new(SpyScope::root(timeline.clone(), true)),
        ScopeBehaviour::ChildScopePerMessage,
    );

    broker.subscribe::<ScopedEvent, TimelineHandler>();
    let err = broker.publish(ScopedEvent).await.unwrap_err();
    assert!(matches!(err, BrokerError::EventHandler { .. }));

    let entries = timeline_of(&timeline);
    let child_tag = entries[0].strip_prefix("create ").unwrap().to_string();
    assert_eq!(
        entries.last().unwrap(),
        &format!("release {child_tag}"),
        "scope must be released on the failure path too"
    );
}

// ---- 自定义切面：以接口视图订阅一族事件 -----------------------------------

trait AuditEvent: DomainEvent {
    fn actor(&self) -> &str;
}

struct UserRenamed {
    actor: String,
}

impl DomainEvent for UserRenamed {
    fn event_type(&self) -> &'static str {
        "UserRenamed"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn facets(&self) -> Vec<Facet<'_>> {
        vec![Facet::of::<dyn AuditEvent>(self)]
    }
}

impl AuditEvent for UserRenamed {
    fn actor(&self) -> &str {
        &self.actor
    }
}

struct AuditTrail {
    actors: Arc<Mutex<Vec<String>>>,
}

impl Handle<dyn AuditEvent> for AuditTrail {
    fn handle(&self, event: &dyn AuditEvent) -> BrokerResult<()> {
        self.actors.lock().unwrap().push(event.actor().to_string());
        Ok(())
    }
}

struct ConcreteTrail {
    order: Arc<Mutex<Vec<&'static str>>>,
}

impl Handle<UserRenamed> for ConcreteTrail {
    fn handle(&self, _event: &UserRenamed) -> BrokerResult<()> {
        self.order.lock().unwrap().push("concrete");
        Ok(())
    }
}

struct EverythingTrail {
    order: Arc<Mutex<Vec<&'static str>>>,
}

impl Handle<AllEvents> for EverythingTrail {
    fn handle(&self, _event: &AllEvents) -> BrokerResult<()> {
        self.order.lock().unwrap().push("all");
        Ok(())
    }
}

struct FacetTrail {
    order: Arc<Mutex<Vec<&'static str>>>,
}

impl Handle<dyn AuditEvent> for FacetTrail {
    fn handle(&self, _event: &dyn AuditEvent) -> BrokerResult<()> {
        self.order.lock().unwrap().push("facet");
        Ok(())
    }
}

struct FacetScope {
    actors: Arc<Mutex<Vec<String>>>,
    order: Arc<Mutex<Vec<&'static str>>>,
    tag: u64,
}

impl HandlerScope for FacetScope {
    fn tag(&self) -> u64 {
        self.tag
    }

    fn create_child(&self) -> BrokerResult<Box<dyn HandlerScope>> {
        Ok(Box::new(Self {
            actors: self.actors.clone(),
            order: self.order.clone(),
            tag: next_tag(),
        }))
    }

    fn resolve(&self, handler: &HandlerType) -> BrokerResult<Box<dyn Any + Send>> {
        if handler.id == TypeId::of::<AuditTrail>() {
            Ok(Box::new(AuditTrail {
                actors: self.actors.clone(),
            }))
        } else if handler.id == TypeId::of::<ConcreteTrail>() {
            Ok(Box::new(ConcreteTrail {
                order: self.order.clone(),
            }))
        } else if handler.id == TypeId::of::<FacetTrail>() {
            Ok(Box::new(FacetTrail {
                order: self.order.clone(),
            }))
        } else if handler.id == TypeId::of::<EverythingTrail>() {
            Ok(Box::new(EverythingTrail {
                order: self.order.clone(),
            }))
        } else {
            Err(BrokerError::Resolve {
                handler: handler.name,
                reason: "unknown handler type in test scope".into(),
            })
        }
    }
}

fn facet_broker() -> (MessageBroker, Arc<Mutex<Vec<String>>>, Arc<Mutex<Vec<&'static str>>>) {
    let actors = Arc::new(Mutex::new(Vec::new()));
    let order = Arc::new(Mutex::new(Vec::new()));
    let scope = FacetScope {
        actors: actors.clone(),
        order: order.clone(),
        tag: next_tag(),
    };
    (
        MessageBroker::new(Arc::new(scope), ScopeBehaviour::NoChildScopes),
        actors,
        order,
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn facet_handler_sees_the_typed_interface_view() {
    let (broker, actors, _order) = facet_broker();
    broker.subscribe::<dyn AuditEvent, AuditTrail>();

    broker
        .publish(UserRenamed {
            actor: "ops".into(),
        })
        .await
        .unwrap();

    assert_eq!(*actors.lock().unwrap(), vec!["ops".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn declared_facets_fire_before_catch_all_and_concrete() {
    let (broker, _actors, order) = facet_broker();
    // 订阅顺序故意与分发顺序相反
    broker.subscribe::<UserRenamed, ConcreteTrail>();
    broker.subscribe::<AllEvents, EverythingTrail>();
    broker.subscribe::<dyn AuditEvent, FacetTrail>();

    broker
        .publish(UserRenamed {
            actor: "ops".into(),
        })
        .await
        .unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["facet", "all", "concrete"]);
}

// ---- 请求切面：以应答类型视图订阅一族请求 ---------------------------------

struct LookupGreeting;

impl DomainRequest for LookupGreeting {
    type Response = String;

    fn request_type(&self) -> &'static str {
        "LookupGreeting"
    }

    fn facets(&self) -> Vec<RequestFacet<'_>> {
        vec![RequestFacet::of::<RequestsAnswering<String>>(self)]
    }
}

struct AnswersAnyStringRequest;

impl HandleRequest<RequestsAnswering<String>> for AnswersAnyStringRequest {
    fn handle(&self, request: &RequestsAnswering<String>) -> BrokerResult<Option<String>> {
        Ok(Some(format!("answered {}", request.request_type())))
    }
}

struct RequestScope {
    tag: u64,
}

impl HandlerScope for RequestScope {
    fn tag(&self) -> u64 {
        self.tag
    }

    fn create_child(&self) -> BrokerResult<Box<dyn HandlerScope>> {
        Ok(Box::new(Self { tag: next_tag() }))
    }

    fn resolve(&self, handler: &HandlerType) -> BrokerResult<Box<dyn Any + Send>> {
        if handler.id == TypeId::of::<AnswersAnyStringRequest>() {
            Ok(Box::new(AnswersAnyStringRequest))
        } else {
            Err(BrokerError::Resolve {
                handler: handler.name,
                reason: "unknown handler type in test scope".into(),
            })
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn request_facet_handler_answers_for_the_concrete_request() {
    let broker = MessageBroker::new(
        Arc::new(RequestScope { tag: next_tag() }),
        ScopeBehaviour::NoChildScopes,
    );
    broker.subscribe_request::<RequestsAnswering<String>, AnswersAnyStringRequest>();

    let response = broker.request(LookupGreeting).await.unwrap();

    assert_eq!(response.as_deref(), Some("answered LookupGreeting"));
}
