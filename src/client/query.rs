use std::collections::BTreeMap;

use url::form_urlencoded;

/// Query-string builder mirroring the daemon's conventions: zero values are
/// left out, flags are sent as `1` and keys come out sorted.
#[derive(Default, Debug)]
pub struct QueryString {
    pairs: BTreeMap<&'static str, String>,
}

impl QueryString {
    pub fn new() -> QueryString {
        QueryString::default()
    }

    pub fn string(mut self, key: &'static str, value: &str) -> QueryString {
        if !value.is_empty() {
            self.pairs.insert(key, value.to_string());
        }
        self
    }

    pub fn flag(mut self, key: &'static str, value: bool) -> QueryString {
        if value {
            self.pairs.insert(key, "1".to_string());
        }
        self
    }

    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}
