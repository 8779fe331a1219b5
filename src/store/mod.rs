pub mod cookie;
pub mod file;
pub mod jar;
pub mod memory;
pub mod store;

pub use cookie::{Cookie, CookieLifetime, CookieScope};
pub use file::FileJar;
pub use jar::{CookieJar, JarError, JarErrorKind};
pub use memory::MemoryJar;
pub use store::{ConsentStore, CookieNames};
