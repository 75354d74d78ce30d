pub mod error;
pub mod kv;
pub mod storage;
pub mod types;

pub use error::{Error, SubscribeError};
pub use kv::KeyValueStore;
pub use storage::{CategoryFilter, ContentStore, StoreCapabilities};
pub use types::{
    Article, ArticleSource, ModelScore, Regulation, RegulationStatus, Impact, ScoreDimension,
    TagCount, TimelineEvent, TimelineKind, Trend, Voice,
};

pub type Result<T> = std::result::Result<T, Error>;
