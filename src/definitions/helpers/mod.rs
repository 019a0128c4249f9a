pub mod embedded_sign1;
pub mod non_empty_vec;
pub mod tag24;

pub use embedded_sign1::EmbeddedSign1;
pub use non_empty_vec::NonEmptyVec;
pub use tag24::Tag24;
