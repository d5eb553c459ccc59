//! Protocol module containing the opcode table, command construction, and the
//! event-name registry.

pub mod command;
pub mod events;
pub mod opcodes;

pub use command::{
    CameraType, Command, CommandArg, ConnectOptions, ContractViolation, EncodingParameters,
};
pub use events::{EventName, EventPayload, NativeNotification, UnknownEventName};
pub use opcodes::{ArgKind, Opcode, PROTOCOL_VERSION};
