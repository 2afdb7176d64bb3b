//! Caller-side half of the generation path: session cache, auth recovery
//! with a single retry, error normalisation and the wizard's request builders.

pub mod fingerprint;
pub mod invoker;
pub mod outputs;
pub mod requests;
pub mod session;
pub mod storage;
pub mod timeout;
pub mod wrapper;

pub use invoker::{FunctionInvoker, HttpFunctionInvoker, InvokeError};
pub use outputs::{load_outputs, save_outputs, OutputBundle};
pub use session::{LocalSession, Session, SessionManager};
pub use storage::{MemorySessionStorage, SessionStorage, StorageError};
pub use timeout::{with_timeout, TimeoutError};
pub use wrapper::{ClientError, GenerationClient, InvokeFailure, InvokeResult};
