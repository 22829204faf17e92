mod attributes;
mod playlist;
mod source;
mod url;

pub use playlist::*;
pub use source::load_playlist;
pub use url::resolve;
