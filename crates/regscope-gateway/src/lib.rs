pub mod ecfr_gateway;
pub mod source;
pub mod static_gateway;

pub use ecfr_gateway::{EcfrGateway, GatewayKey};
pub use source::*;
pub use static_gateway::{GatewayCalls, StaticGateway};
