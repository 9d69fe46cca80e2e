// Domain-layer modules and shared errors/models
pub mod models {
    pub use crate::models::*;
}

pub mod services {
    pub use crate::services::*;
}

pub mod artifact {
    pub use crate::artifact::*;
}

pub mod errors {
    pub use crate::errors::*;
}
