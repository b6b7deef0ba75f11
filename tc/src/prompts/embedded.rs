//! Embedded prompts
//!
//! Compiled into the binary from the .pmt files in `tc/prompts/`.

use tracing::debug;

/// System prompt for origin/destination extraction
pub const GATHER: &str = include_str!("../../prompts/gather.pmt");

/// Prompt that turns the itinerary into a conversational reply
pub const REPLY: &str = include_str!("../../prompts/reply.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "gather" => Some(GATHER),
        "reply" => Some(REPLY),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
