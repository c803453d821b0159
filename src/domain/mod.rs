//! Domain model for subscriptions
//!
//! All invariants live here: the month-granularity date and price value
//! types, the subscription aggregate, and the filter/paging objects used
//! by list and sum queries.

mod subscription;

pub use subscription::{
    DomainError, MonthDate, PagingBase, Price, Subscription, SubscriptionFilter, SumResult,
    DEFAULT_LIMIT,
};
