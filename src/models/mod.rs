pub mod seat;
pub mod subscription;
pub mod interaction;

pub use seat::{Seat, SeatGroup};
pub use subscription::{Subscription, SubscriptionKey};
pub use interaction::{InteractionState, TargetIntent};
