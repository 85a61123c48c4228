//! ppbridge Host Bridge
//!
//! Lets an embedding host expand function macros with its own callables.
//!
//! ## Modules
//!
//! - `host` - Host value model and the callable contract
//! - `handle` - Counted session handle exposed to the host
//! - `token_value` - Engine token to host token conversion
//! - `location` - Engine position to host location conversion
//! - `function_macro` - The callback adapter invoked by the engine
//! - `session` - Preprocessor session facade

pub mod function_macro;
pub mod handle;
pub mod host;
pub mod location;
pub mod session;
pub mod token_value;

pub use function_macro::{CallbackMacro, InvocationContext, MacroResult};
pub use handle::SessionHandle;
pub use host::{host_fn, HostCallable, HostError, HostValue};
pub use location::{to_host_location, HostLocation};
pub use session::{Session, SessionId};
pub use token_value::{from_host_value, to_host_value, HostToken};
