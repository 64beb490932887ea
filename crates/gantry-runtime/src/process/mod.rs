//! Process lifecycle primitives: spawning, log forwarding, port checks,
//! and graceful shutdown.

mod listen;
mod shutdown;
mod spawn;
mod types;

pub use listen::is_port_available;
pub use shutdown::{kill_pid, shutdown_child};
pub use spawn::spawn_app;
pub use types::{AppProcessInfo, RunningApp};
