//! Token secrets and the fixed-shape records stored for each credential kind.

pub mod record;
pub mod secret;
