/// Upper bound on reference substitutions while expanding one expression.
pub const MAX_EXPANSIONS: usize = 10_000;

/// Metatable `__type` marker for command bindings created by `pake.command`.
pub const COMMAND_TYPE: &str = "pake.command";
