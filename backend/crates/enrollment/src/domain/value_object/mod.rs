pub mod slug;
pub mod subscription_status;

pub use slug::Slug;
pub use subscription_status::SubscriptionStatus;
