//! Output writers for a finished generation run.

pub mod typescript;

pub use typescript::render_declarations;
