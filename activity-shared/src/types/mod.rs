mod feed_item;
mod stream_item;

pub use feed_item::FeedItem;
pub use stream_item::{RecencyKey, StreamItem};
