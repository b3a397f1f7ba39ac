// LaTeX side of the pipeline: escape, template, render, validate, compile.
// Compilation is the only part that touches the filesystem or spawns processes.

pub mod compiler;
pub mod delivery;
pub mod escape;
pub mod handlers;
pub mod render;
pub mod template;
pub mod templates;
pub mod validation;

pub use compiler::{CompileError, LatexCompiler};
pub use render::{generate_cover_letter_latex, generate_resume_latex, resume_latex};
pub use validation::{extract_metadata, validate};
