pub mod fixtures;
pub mod memory;
pub mod storage;

#[allow(unused_imports)]
pub use fixtures::{build_descriptor_zip, build_zip, build_zip_with_dirs, event_for};
#[allow(unused_imports)]
pub use memory::MemoryStore;
#[allow(unused_imports)]
pub use storage::TestStorage;
