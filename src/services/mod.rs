pub mod bot;
pub mod dialogue;
pub mod messages;
pub mod monitor;
pub mod subscriptions;
