pub mod admin;
pub mod invoke;

pub use admin::admin_router;
pub use invoke::invoke_router;
