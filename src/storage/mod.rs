pub mod skiplist;

pub use skiplist::{SkipList, DEFAULT_SKIP_LIST_PATH};
