//! LINE Messaging API channel: webhook decoding, signature checks, and the
//! outbound reply/content client.

pub mod line;
pub mod line_receive;
pub mod line_send;

pub use line::decode_event;
pub use line_receive::{
    normalize, sign_body, verify_signature, Normalized, SignatureVerifier, SIGNATURE_HEADER,
};
pub use line_send::{LineClient, LineClientConfig};
