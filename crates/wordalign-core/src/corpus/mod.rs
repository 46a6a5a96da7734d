pub mod encoder;
pub mod vocab;

pub use encoder::{EncodedCorpus, encode_to_file, tokenize};
pub use vocab::Vocabulary;
