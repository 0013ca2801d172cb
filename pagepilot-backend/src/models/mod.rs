mod auto_hide;
mod auto_post;
mod quote;

pub use auto_hide::*;
pub use auto_post::*;
pub use quote::*;
