//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module      | Commands handled                |
//! |-------------|---------------------------------|
//! | `board`     | `Board`                         |
//! | `config`    | `Init`, `Config`                |
//! | `epics`     | `Epics`                         |
//! | `workflows` | `Workflows`                     |
//! | `export`    | `Export`                        |

pub mod board;
pub mod config;
pub mod epics;
pub mod export;
pub mod workflows;

pub use board::cmd_board;
pub use config::{cmd_config, cmd_init};
pub use epics::cmd_epics;
pub use export::cmd_export;
pub use workflows::cmd_workflows;
