//! # readygate
//!
//! Library half of the readygate binary: probes, the async gate runner, the
//! successor handoff and the CLI. Exposed as a library so the integration
//! tests can drive the gate with scripted probes and launchers.

pub mod cli;
pub mod gate;
pub mod handoff;
pub mod probe;

pub use gate::Gate;
pub use handoff::{HandoffMode, Launcher, ProcessLauncher};
pub use probe::{Prober, SystemProber};
