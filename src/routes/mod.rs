/// Router Module Index
///
/// Routes are grouped by the access level they require. `create_router` wraps each
/// group in the matching middleware layer, so a handler's module decides who may
/// reach it.

/// Routes open to anonymous visitors: login, logout, health and the auth probe.
pub mod public;

/// Routes that need a signed-in user of any role.
pub mod authenticated;

/// Routes restricted to users holding the `admin` role.
pub mod admin;
