//! Deterministic cache key construction
//!
//! A key is `prefix` followed by an encoding of the query parameters. The
//! prefix is kept verbatim so that every key of an entity type can be removed
//! with a single prefix scan.

use serde_json::Value;

/// Ordered set of named query parameters
///
/// Names are unique: setting an existing name replaces its value in place,
/// keeping the original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pairs: Vec<(String, Value)>,
}

impl QueryParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, builder style
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a parameter only when a value is present
    pub fn with_opt<V: Into<Value>>(mut self, name: impl Into<String>, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.set(name, value);
        }
        self
    }

    /// Set a parameter
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((name, value)),
        }
    }

    /// Append every parameter of `other`
    pub fn extend(&mut self, other: QueryParams) {
        for (name, value) in other.pairs {
            self.set(name, value);
        }
    }

    /// Look up a parameter by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.pairs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Render as plain string pairs for a URL query
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.pairs
            .iter()
            .map(|(name, value)| {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (name.clone(), rendered)
            })
            .collect()
    }
}

/// Order in which parameters are serialized into a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyOrdering {
    /// Sorted by parameter name. Equal parameter sets always give equal keys.
    #[default]
    Canonical,
    /// Insertion order. Two sets holding the same pairs in a different order
    /// produce different keys, which splits the cache for equivalent queries.
    Insertion,
}

/// How the serialized parameters are folded into the key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyEncoding {
    /// 64-bit rolling hash of the serialized parameters. Compact, with a
    /// negligible but non-zero collision probability.
    #[default]
    Hashed,
    /// The full serialized parameters. Collision free, unbounded length.
    Verbatim,
}

/// Builds cache keys from a prefix and a parameter set
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyBuilder {
    ordering: KeyOrdering,
    encoding: KeyEncoding,
}

impl KeyBuilder {
    /// Canonical ordering, hashed encoding
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ordering(mut self, ordering: KeyOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_encoding(mut self, encoding: KeyEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Serialize parameters to a JSON object string
    pub fn serialize(&self, params: &QueryParams) -> String {
        let mut pairs: Vec<(&str, &Value)> = params.iter().collect();
        if self.ordering == KeyOrdering::Canonical {
            pairs.sort_by(|a, b| a.0.cmp(b.0));
        }

        let body = pairs
            .iter()
            .map(|(name, value)| format!("{}:{}", Value::from(*name), value))
            .collect::<Vec<_>>()
            .join(",");
        format!("{{{}}}", body)
    }

    /// Build the key for `params` under `prefix`
    pub fn build_key(&self, prefix: &str, params: &QueryParams) -> String {
        let serialized = self.serialize(params);
        match self.encoding {
            KeyEncoding::Hashed => format!("{}{:016x}", prefix, rolling_hash(&serialized)),
            KeyEncoding::Verbatim => format!("{}{}", prefix, serialized),
        }
    }
}

/// Polynomial rolling hash over the UTF-8 bytes of `input`
pub fn rolling_hash(input: &str) -> u64 {
    const SEED: u64 = 0xcbf2_9ce4_8422_2325;
    const BASE: u64 = 0x0000_0100_0000_01b3;

    input
        .bytes()
        .fold(SEED, |hash, byte| hash.wrapping_mul(BASE).wrapping_add(u64::from(byte)))
}
