//! # printkit
//!
//! A Rust-based Marlin G-code generator and sender for 3D printers.
//!
//! ## Architecture
//!
//! printkit is organized as a workspace:
//!
//! 1. **printkit-core** - command model, builders, tokenizer, error types
//! 2. **printkit-communication** - streaming engine and transports
//!    (Serial/USB, remote Griffin shell)
//! 3. **printkit** - the interactive console binary
//!
//! ## Features
//!
//! - **Typed commands**: opcode plus single-letter parameters, built through
//!   human-friendly helpers (`set_bedtemp`, `home_axis`, `travel`, ...)
//! - **Checksummed streaming**: protocol line numbers and XOR checksums in
//!   the Marlin `N<line> ... *<cs>` framing, with automatic `M110` injection
//! - **Audit history**: every line actually sent is kept, with its assigned
//!   line number
//! - **Pluggable transports**: serial port, remote Griffin shell over ssh,
//!   or plain stdout for dry runs

pub use printkit_communication::{
    CommandStreamer, ConnectionParams, ConsoleSink, GriffinParams, GriffinShell, LineSink,
    SerialConnection, StreamerConfig,
};
pub use printkit_core::{
    gcode, line_checksum, parse_line, Command, Error, ExtrusionMode, GcodeError, ParamValue,
    Positioning, Travel, Units,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - stderr output, so the console prompt keeps stdout to itself
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
