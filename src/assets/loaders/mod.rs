//! Pure asset parsers: bytes in, CPU data out.

pub mod image;
pub mod obj;

pub use self::image::{ImageData, TextureFlags, decode_cubemap, decode_image, mip_level_count};
pub use obj::parse_obj;
