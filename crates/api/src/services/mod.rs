pub mod activities;
pub mod attendance;
pub mod audit;
pub mod auth;
pub mod diplomas;
pub mod enrollment;
pub mod mailer;
pub mod payments;
pub mod permissions;
pub mod reports;
pub mod users;

pub use activities::ActivityService;
pub use attendance::AttendanceService;
pub use audit::AuditLog;
pub use auth::{AuthService, TokenService};
pub use diplomas::DiplomaService;
pub use enrollment::EnrollmentService;
pub use mailer::{Mailer, Notification, Notifier, OutboxMailer};
pub use payments::PaymentService;
pub use permissions::PermissionService;
pub use reports::ReportService;
pub use users::UserService;
