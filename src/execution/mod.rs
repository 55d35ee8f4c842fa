pub mod builder;
pub mod signature;
pub mod submitter;

pub use builder::PaymentBuilder;
pub use signature::Keypair;
pub use submitter::TransactionSubmitter;
