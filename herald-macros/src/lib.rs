use proc_macro::TokenStream;

mod aggregate_event;

/// 聚合事件宏
/// - 仅支持具名字段结构体，且必须包含 `aggregate_id` 字段（其类型即标识类型）
/// - 生成 `DomainEvent`/`AggregateEvent` 实现与切面声明（含风味切面）
/// - 支持参数：`#[aggregate_event(aggregate = "Name", kind = created|changed)]`
/// - 结构体需自行派生 `Clone`（`clone_event` 依赖之）
#[proc_macro_attribute]
pub fn aggregate_event(attr: TokenStream, item: TokenStream) -> TokenStream {
    aggregate_event::expand(attr, item)
}
