pub mod actions;
pub mod auto_finish;
pub mod billing;
pub mod dirty_queue;
pub mod generator;
pub mod notifier;
pub mod policy;
pub mod reminders;
