pub mod dec;
pub mod enc;
pub mod init;
pub mod post;
pub mod version;

pub use dec::Dec;
pub use enc::Enc;
pub use init::Init;
pub use post::Post;
pub use version::Version;
