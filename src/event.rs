use compact_str::CompactString;

use crate::{client::fetcher::PollTarget, domain::ActivityDto, id::SubscriptionId};

/// Lifecycle notification from the polling subsystem.
///
/// Every variant carries the subscription it concerns. Notifications are
/// fire-and-forget: they are pushed onto an unbounded channel and a slow or
/// absent listener can never delay a tick.
#[derive(Debug, Clone)]
pub enum PollEvent {
    SubscriptionAdded(SubscriptionId, PollTarget),
    SubscriptionRemoved(SubscriptionId),
    /// `remove` was called with an id the registry does not know
    SubscriptionNotFound(SubscriptionId),
    TickStarted(SubscriptionId),
    EventDelivered(SubscriptionId, ActivityDto),
    FetchFailed(SubscriptionId, CompactString),
    CallbackFailed(SubscriptionId, CompactString),
}

impl PollEvent {
    /// Get the variant name as a string slice (without "PollEvent::" prefix)
    pub fn variant_name(&self) -> &'static str {
        match self {
            PollEvent::SubscriptionAdded(_, _) => "SubscriptionAdded",
            PollEvent::SubscriptionRemoved(_) => "SubscriptionRemoved",
            PollEvent::SubscriptionNotFound(_) => "SubscriptionNotFound",
            PollEvent::TickStarted(_) => "TickStarted",
            PollEvent::EventDelivered(_, _) => "EventDelivered",
            PollEvent::FetchFailed(_, _) => "FetchFailed",
            PollEvent::CallbackFailed(_, _) => "CallbackFailed",
        }
    }

    pub fn subscription_id(&self) -> SubscriptionId {
        match self {
            PollEvent::SubscriptionAdded(id, _)
            | PollEvent::SubscriptionRemoved(id)
            | PollEvent::SubscriptionNotFound(id)
            | PollEvent::TickStarted(id)
            | PollEvent::EventDelivered(id, _)
            | PollEvent::FetchFailed(id, _)
            | PollEvent::CallbackFailed(id, _) => *id,
        }
    }
}
