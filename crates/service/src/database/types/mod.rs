mod dlink;

pub use dlink::DLink;
