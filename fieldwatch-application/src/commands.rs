// Commands: operations that change state
pub mod alert_commands;
pub mod audit_commands;
pub mod rules_commands;
