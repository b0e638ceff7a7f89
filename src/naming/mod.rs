pub mod path;
pub mod sanitize;

pub use path::unique_output_path;
pub use sanitize::sanitize_filename;
