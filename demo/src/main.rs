use herald_eventsourcing::{Aggregate, Apply, EventApplier, EventSourcedRepository, EventStore};
use herald_macros::aggregate_event;
use herald_messages::{
    AggregateCreatedEvents, AggregateEvent, AggregateEvents, BrokerConfig, BrokerResult,
    DomainRequest, FactoryScope, Handle, HandleRequest, MessageBroker, ScopeBehaviour,
    SubscriptionSet,
};
use std::sync::Arc;
use uuid::Uuid;

#[aggregate_event(aggregate = "Account", kind = created)]
#[derive(Clone)]
struct AccountOpened {
    aggregate_id: Uuid,
    owner: String,
}

#[aggregate_event(aggregate = "Account", kind = changed)]
#[derive(Clone)]
struct AccountRenamed {
    aggregate_id: Uuid,
    new_name: String,
}

#[derive(Default)]
struct Account {
    id: Option<Uuid>,
    name: Option<String>,
}

impl Aggregate for Account {
    const TYPE: &'static str = "Account";
    type Id = Uuid;

    fn applier() -> EventApplier<Self> {
        EventApplier::new()
            .on::<AccountOpened>()
            .on::<AccountRenamed>()
    }
}

impl Apply<AccountOpened> for Account {
    fn apply(&mut self, event: &AccountOpened) {
        self.id = Some(event.aggregate_id);
        self.name = Some(event.owner.clone());
    }
}

impl Apply<AccountRenamed> for Account {
    fn apply(&mut self, event: &AccountRenamed) {
        self.name = Some(event.new_name.clone());
    }
}

/// 审计：订阅“已创建”切面，记录每个新聚合
struct OpeningAudit;

impl Handle<AggregateCreatedEvents<Uuid>> for OpeningAudit {
    fn handle(&self, event: &AggregateCreatedEvents<Uuid>) -> BrokerResult<()> {
        println!(
            "[audit] {} created: {:?}",
            event.aggregate_type(),
            event.aggregate_id()
        );
        Ok(())
    }
}

/// 查询当前名称的领域请求
struct AccountNameQuery {
    account: Uuid,
}

impl DomainRequest for AccountNameQuery {
    type Response = String;

    fn request_type(&self) -> &'static str {
        "AccountNameQuery"
    }
}

struct AccountNameFromHistory {
    store: Arc<EventStore>,
}

impl HandleRequest<AccountNameQuery> for AccountNameFromHistory {
    fn handle(&self, request: &AccountNameQuery) -> BrokerResult<Option<String>> {
        let repository = EventSourcedRepository::<Uuid>::new(self.store.clone());
        let account: Account =
            repository
                .get(&request.account)
                .map_err(|e| herald_messages::BrokerError::RequestHandler {
                    handler: "AccountNameFromHistory".into(),
                    reason: e.to_string(),
                })?;

        Ok(account.name)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let scope = Arc::new(FactoryScope::new());
    let store = Arc::new(EventStore::new());

    let repository_store = store.clone();
    scope.register(move |_| EventSourcedRepository::<Uuid>::new(repository_store.clone()));
    scope.register(|_| OpeningAudit);
    let query_store = store.clone();
    scope.register(move |_| AccountNameFromHistory {
        store: query_store.clone(),
    });

    let broker = MessageBroker::with_config(
        scope,
        BrokerConfig::builder()
            .scope_behaviour(ScopeBehaviour::ChildScopePerMessage)
            .build(),
    );
    SubscriptionSet::new()
        .event::<AggregateEvents<Uuid>, EventSourcedRepository<Uuid>>()
        .event::<AggregateCreatedEvents<Uuid>, OpeningAudit>()
        .request::<AccountNameQuery, AccountNameFromHistory>()
        .apply(&broker);

    let account = Uuid::new_v4();
    broker
        .publish(AccountOpened {
            aggregate_id: account,
            owner: "amy".into(),
        })
        .await?;
    broker
        .publish(AccountRenamed {
            aggregate_id: account,
            new_name: "amy west".into(),
        })
        .await?;

    let replayed: Account = EventSourcedRepository::<Uuid>::new(store).get(&account)?;
    println!("[replay] account {:?} name = {:?}", replayed.id, replayed.name);

    let answer = broker.request(AccountNameQuery { account }).await?;
    println!("[request] name = {answer:?}");

    Ok(())
}
