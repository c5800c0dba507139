// Utility functions

pub mod logger;

pub use logger::*;

use std::error::Error;

/// Render an error together with its `source()` chain.
///
/// reqwest and lopdf keep the useful detail (connection refused, DNS failure,
/// bad xref) in the source, not in the top-level message.
pub fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}
