pub mod commander;
pub mod encode;
pub mod intent;
pub mod wire;

pub use commander::Commander;
pub use intent::{CommandIntent, ModeMap, YawDirection};
pub use wire::SetpointOrder;
