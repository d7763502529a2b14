//! Stream session: the controller, its caller-facing events and the state it reads

pub mod controller;
pub mod events;
pub mod state;

pub use controller::{ControllerStatus, StreamController, MODE};
pub use events::{StreamEvent, StreamInfo};
pub use state::{SessionState, SourceResolution, SourceState, StreamerState};
