mod from_cbor;
mod to_cbor;

pub use from_cbor::FromCbor;
pub(crate) use to_cbor::value_error;
pub use to_cbor::ToCbor;
