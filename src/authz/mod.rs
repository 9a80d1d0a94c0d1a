//! Project-scoped role based access control.
//!
//! Two role axes are evaluated for every project operation:
//! - the platform role on the caller's profile (`platform_admin` bypasses everything)
//! - the caller's membership role inside the target project
//!
//! Handlers declare what they need through the [`Authorized`] extractor.

mod evaluator;
mod extract;
mod roles;

pub use evaluator::{resolve, AuthzError, RoleSource};
pub use extract::{parse_id, Access, Authorized, Own, Requirement, Write};
pub use roles::{AccessClass, AccessGrant, PlatformRole, ProjectRole};
