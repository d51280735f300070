mod converter;
mod direct;
mod innertube;
mod ytdlp;

pub use converter::ConverterAdapter;
pub use direct::DirectAdapter;
pub use innertube::InnertubeAdapter;
pub use ytdlp::YtdlpAdapter;
