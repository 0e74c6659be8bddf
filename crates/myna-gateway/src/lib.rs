//! Messaging gateway seam for the myna macro engine
//!
//! The engine talks to the chat platform exclusively through the [`Gateway`]
//! trait; transports implement it, tests use [`MockGateway`].

pub mod clock;
pub mod error;
pub mod gateway;
pub mod mock;

pub use clock::{Clock, MockClock, SystemClock};
pub use error::{Error, Result};
pub use gateway::{display_channel, Gateway};
pub use mock::{GatewayCall, MockGateway};
