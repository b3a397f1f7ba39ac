// Resume text pipeline: classify, parse, format and limit.
// Everything here is pure and synchronous; safe to call from any request task.

pub mod classifier;
pub mod limiter;
pub mod parser;
pub mod sections;

pub use classifier::is_latex_content;
pub use limiter::OnePageLimits;
pub use parser::{parse, parse_with, ParsedResume, SectionKey};
