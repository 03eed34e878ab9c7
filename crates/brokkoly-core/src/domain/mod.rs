//! Domain model (signatures, payloads, ids, errors).

pub mod errors;
pub mod ids;
pub mod payload;
pub mod signature;
pub mod state;
pub mod validation;

pub use self::errors::{BrokerError, BrokkolyError, RequestError, Stage, TaskError};
pub use self::ids::{InvalidJobHandle, JobHandle};
pub use self::payload::{Payload, parse_message};
pub use self::signature::{Param, ParamType, SignatureError, TaskSignature};
pub use self::state::JobState;
pub use self::validation::validate;
