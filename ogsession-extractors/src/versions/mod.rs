//! Layers per server version family.

mod base;
mod v11;
mod v12;
mod v9;

pub use base::BaseLayer;
pub use v11::V11Layer;
pub use v12::V12Layer;
pub use v9::V9Layer;
