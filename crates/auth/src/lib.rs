//! `innkeep-auth`: capability-based authorization for hotel staff.
//!
//! Login is out of scope: a [`Principal`] is built from a stored [`User`] and its
//! role, and every guarded operation goes through [`authorize`].

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod user;

pub use authorize::{AuthzError, CommandAuthorization, authorize, authorize_command};
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::{Role, role_permissions};
pub use user::{NewUser, User, UserStatus};
