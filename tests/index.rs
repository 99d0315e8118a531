#[path = "util/mod.rs"]
#[macro_use]
mod util;

mod blocking;
mod host;
mod readiness;
mod stream;
