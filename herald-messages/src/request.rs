//! 领域请求能力边界
//!
//! 请求与其应答类型的配对通过关联类型钉死在请求类型自身上，因此
//! “请求必须自引用其具体类型”的约束在构造期之前 —— 编译期 —— 即成立。
//! 应答的“缺席”用 `Option::None` 表达，与处理器失败（`Err`）互不混淆。
//!
use crate::dispatch::RequestFacet;
use std::any::Any;

/// 领域请求能力标记：一个请求类型恰好配对一个应答类型
pub trait DomainRequest: Any + Send + Sync + 'static {
    /// 该请求的应答类型
    type Response: Send + 'static;

    /// 请求类型名（诊断与日志用）
    fn request_type(&self) -> &'static str;

    /// 该请求声明的切面视图，按声明顺序分发；
    /// 切面视图的应答类型必须与具体请求一致
    fn facets(&self) -> Vec<RequestFacet<'_>> {
        Vec::new()
    }
}

/// 切面别名：应答类型为 `R` 的全部请求
pub type RequestsAnswering<R> = dyn DomainRequest<Response = R>;
