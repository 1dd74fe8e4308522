//! Data-quality gate applied to every event before it may touch the store.

use crate::core::event::{Event, Verb};
use crate::core::store::RecordStore;

/// Returns `true` if `event` may be applied to `store` as it stands now.
///
/// Only UPDATE events can fail: CUSTOMER/UPDATE and ORDER/UPDATE require the
/// key to already exist in their table. Every NEW and every IMAGE/SITE_VISIT
/// event passes.
pub fn dq_check(store: &RecordStore, event: &Event) -> bool {
    if event.verb() != Some(Verb::Update) {
        return true;
    }
    match event {
        Event::Customer(_) => store.customers.contains(event.key()),
        Event::Order(_) => store.orders.contains(event.key()),
        Event::Image(_) | Event::SiteVisit(_) => true,
    }
}
