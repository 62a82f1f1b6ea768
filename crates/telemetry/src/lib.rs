pub mod aggregator;
pub mod history;

pub use aggregator::Aggregator;
pub use history::HistoryBuffer;
