pub mod catalog;
pub mod demo;
pub mod keygen;
#[cfg(feature = "postgres")]
pub mod migrate;
pub mod quote;
