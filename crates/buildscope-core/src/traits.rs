use crate::filter::FetchIntent;
use crate::types::{DictionarySource, PreferenceKey};

/// Performs upstream requests. The engine never talks to the network itself;
/// it hands out intents and consumes the raw bytes that come back.
pub trait FetchTransport: Send + Sync {
    fn fetch(&self, intent: &FetchIntent) -> anyhow::Result<Vec<u8>>;

    /// Provenance stamped on dictionaries this transport serves.
    fn source(&self) -> DictionarySource {
        DictionarySource::Api
    }
}

/// Opaque key/value store for saved basetype selections.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &PreferenceKey) -> anyhow::Result<Option<Vec<String>>>;
    fn set(&self, key: &PreferenceKey, members: &[String]) -> anyhow::Result<()>;
}
