pub mod tcp;
pub mod traits;

#[cfg(test)]
pub mod mock;

pub use tcp::TcpTransport;
pub use traits::InstrumentTransport;
