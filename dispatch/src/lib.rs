//! Command registry, dispatch and completion on top of `worldcmd-core`.
//!
//! - [`Dispatcher`] owns a thread-safe alias table and routes raw lines
//!   to the invocation pipeline, honouring a visibility predicate.
//! - [`Dispatcher::suggest`] completes partially typed lines.
//! - [`Dispatcher::help`] exports [`CommandHelp`] entries as JSON or YAML.
//! - [`DispatcherConfig`] is the YAML configuration file.
//!
//! # Quick start
//!
//! ```no_run
//! use worldcmd_core::{CommandBuilder, Locals};
//! use worldcmd_dispatch::{Dispatcher, DispatcherConfig};
//!
//! let config = DispatcherConfig::load("worldcmd.yml").unwrap();
//! let dispatcher = Dispatcher::with_config(CommandBuilder::new(), config);
//! match dispatcher.dispatch("/sphere stone 5", &Locals::new()) {
//!     Ok(true) => {}
//!     Ok(false) => eprintln!("Unknown command"),
//!     Err(err) => eprintln!("{err}"),
//! }
//! ```

mod config;
mod error;
mod help;
mod registry;
mod suggest;

pub use config::DispatcherConfig;
pub use error::{ConfigError, Result};
pub use help::{CommandHelp, ParameterHelp, to_json, to_yaml};
pub use registry::{Dispatcher, Visibility, VisibilityResult};
