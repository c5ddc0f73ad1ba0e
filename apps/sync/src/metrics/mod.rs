// Pure per-post analytics. No I/O lives here; everything is a function of the
// post, the configured handle/zone, and the sync instant passed in.

pub mod extractor;
pub mod text;

pub use extractor::MetricsExtractor;
