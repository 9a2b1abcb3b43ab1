pub mod publisher;

pub use publisher::{EventPublisher, PublishedEvent, SessionEvent};
