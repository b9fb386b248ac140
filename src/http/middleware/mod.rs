pub mod chaos;

pub use chaos::{chaos_middleware, ChaosState};
