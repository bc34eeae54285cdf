/// Database models
///
/// - [`task`]: the to-do item, owned by a user
/// - [`user`]: accounts that own tasks

pub mod task;
pub mod user;
