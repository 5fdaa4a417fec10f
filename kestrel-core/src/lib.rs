pub mod altda;
pub mod chain;
pub mod codec;
pub mod da;
pub mod proofs;
pub mod wire;

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;
