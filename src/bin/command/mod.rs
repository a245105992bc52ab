mod ingest;
mod mine;
mod stream;

pub use mine::*;
pub use stream::*;
