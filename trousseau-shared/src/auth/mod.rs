/// Authentication primitives
///
/// Only password hashing lives here. Session/token enforcement is handled
/// by callers; the login endpoint returns the authenticated identity and
/// nothing more.

pub mod password;
