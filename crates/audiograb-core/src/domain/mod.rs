mod video_id;

pub use video_id::VideoId;
