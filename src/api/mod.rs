// Thin namespace wrapper for API-layer components
pub mod handlers {
    pub use crate::handlers::*;
}

pub mod openapi {
    pub use crate::openapi::*;
}

pub mod server {
    pub use crate::server::*;
}
