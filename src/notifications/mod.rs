//! Notification pipeline.
//!
//! Dispatch side: [`dispatcher::NotificationDispatcher`] drives the
//! [`directory::TopicDirectory`], the [`subscriptions::SubscriptionManager`]
//! (signup only) and the [`queue::DeliveryQueueClient`], in that order.
//!
//! Delivery side: the queue worker hands each queued intent to the
//! [`renderer::NotificationRenderer`], which publishes to the topic.

pub mod directory;
pub mod dispatcher;
pub mod queue;
pub mod renderer;
pub mod subscriptions;
