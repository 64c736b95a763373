// Library root
// -----------
// Client for the compute unit accounting service. The binary (`main.rs`)
// only parses arguments and reports errors; everything else lives here.
//
// Module responsibilities:
// - `token`: pre-flight checks on the stored bearer token.
// - `classify`: turns an HTTP exchange into a JSON body or an `ApiError`.
// - `api`: the blocking calling surface (`get`, `post`, `balance`, `spend`).
// - `config`: the YAML configuration file.
// - `cli`: command table and command handlers.
// - `ui`: terminal output, spinner and the token prompt.
// - `logging`: tracing setup.
pub mod api;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod token;
pub mod ui;

pub use api::ApiClient;
pub use error::{ApiError, ApiResult};
