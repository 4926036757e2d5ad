pub mod password;
pub mod profile;

pub use password::change_password_post;
pub use profile::profile_get;
