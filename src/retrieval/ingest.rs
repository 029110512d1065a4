//! JSON Lines article ingestion for the local index

use super::IndexError;
use crate::embedding::{EmbeddingError, EmbeddingFamily, Embedders, Pooling};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use std::path::Path;

const EMBED_BATCH_SIZE: usize = 32;

/// One article as stored in the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(deserialize_with = "de_scalar")]
    pub doc_id: String,
    #[serde(default, deserialize_with = "de_scalar")]
    pub title: String,
    #[serde(default, deserialize_with = "de_scalar")]
    pub author: String,
    #[serde(default, deserialize_with = "de_scalar")]
    pub date: String,
    #[serde(default, deserialize_with = "de_scalar")]
    pub content: String,
    #[serde(default, deserialize_with = "de_scalar")]
    pub annotation: String,
    #[serde(default)]
    pub ft_vector: Option<Vec<f32>>,
    #[serde(default)]
    pub sbert_vector: Option<Vec<f32>>,
}

impl DocumentRecord {
    pub fn vector(&self, family: EmbeddingFamily) -> Option<&Vec<f32>> {
        match family {
            EmbeddingFamily::FastText => self.ft_vector.as_ref(),
            EmbeddingFamily::Sbert => self.sbert_vector.as_ref(),
        }
    }

    fn set_vector(&mut self, family: EmbeddingFamily, vector: Vec<f32>) {
        match family {
            EmbeddingFamily::FastText => self.ft_vector = Some(vector),
            EmbeddingFamily::Sbert => self.sbert_vector = Some(vector),
        }
    }
}

/// Accept strings, numbers and null for text fields (dates are often epoch millis)
fn de_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!("expected string or number, got {}", other))),
    }
}

/// Read one [`DocumentRecord`] per non-blank line
pub fn read_jsonl(path: &Path) -> Result<Vec<DocumentRecord>, IndexError> {
    let file = std::fs::File::open(path)?;
    let mut records = Vec::new();

    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: DocumentRecord =
            serde_json::from_str(&line).map_err(|e| IndexError::InvalidRecord {
                line: i + 1,
                message: e.to_string(),
            })?;
        if record.doc_id.is_empty() {
            return Err(IndexError::InvalidRecord {
                line: i + 1,
                message: "empty doc_id".to_string(),
            });
        }
        records.push(record);
    }

    Ok(records)
}

/// Encode `content` for every record lacking a vector of a registered family
///
/// Returns the number of vectors filled.
pub async fn fill_missing_vectors(
    records: &mut [DocumentRecord],
    embedders: &Embedders,
) -> Result<usize, EmbeddingError> {
    let mut filled = 0;

    for family in embedders.families() {
        let Some(client) = embedders.get(family) else {
            continue;
        };
        let missing: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.vector(family).is_none() && !r.content.is_empty())
            .map(|(i, _)| i)
            .collect();

        for chunk in missing.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = chunk.iter().map(|&i| records[i].content.clone()).collect();
            let vectors = client.encode_batch(&texts, Pooling::Mean).await?;
            for (&i, vector) in chunk.iter().zip(vectors) {
                records[i].set_vector(family, vector);
                filled += 1;
            }
        }

        tracing::info!(family = %family, filled = missing.len(), "Filled missing vectors");
    }

    Ok(filled)
}
