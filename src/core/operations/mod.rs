mod file_ops;

pub use file_ops::{copy_into_dir, ensure_dir, FileOpError, FileOpResult};
