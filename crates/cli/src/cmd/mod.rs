mod add;
mod init;
mod list;
mod remove;
mod upgrade;

pub use add::{AddArgs, cmd_add};
pub use init::cmd_init;
pub use list::cmd_list;
pub use remove::cmd_remove;
pub use upgrade::cmd_upgrade;
