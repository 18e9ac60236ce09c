//! Metadata extraction and transformation

pub mod extractor;
pub mod keys;
pub mod transformer;

pub use extractor::{
    DefaultComponentMetaDataExtractor, ExtractionTarget, GroupControllerScanningExtractor, JoinAwareMetaDataExtractor,
    MetaDataExtractor,
};
pub use keys::{merge_meta_data, MetaData};
pub use transformer::MetaDataTransformer;
