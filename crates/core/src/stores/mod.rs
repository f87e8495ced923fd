pub mod json_dir;
pub mod memory;
pub mod question_file;

pub use json_dir::JsonDirectoryStore;
pub use memory::MemoryStore;
pub use question_file::JsonQuestionStore;
