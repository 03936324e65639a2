use uuid::Uuid;

pub mod activity;
pub mod attendance;
pub mod audit;
pub mod diploma;
pub mod enrollment;
pub mod errors;
pub mod payment;
pub mod permission;
pub mod report;
pub mod response;
pub mod user;

pub use activity::*;
pub use attendance::*;
pub use audit::*;
pub use diploma::*;
pub use enrollment::*;
pub use errors::*;
pub use payment::*;
pub use permission::*;
pub use report::*;
pub use response::*;
pub use user::*;

/// Common identifier type
pub type Id = Uuid;

/// Monetary amounts in the smallest currency unit
pub type Cents = i64;
