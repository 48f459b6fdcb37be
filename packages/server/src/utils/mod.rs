pub mod etag;
pub mod hash;
pub mod jwt;
pub mod time;
