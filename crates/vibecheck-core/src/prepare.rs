//! Dataset preparation.
//!
//! Maps source conversations onto the three-role schema, routes every 11th
//! conversation (zero-based index ≡ 10 mod 11) to validation and the rest
//! to training, and cuts fixed-size training prefixes. The split is fully
//! deterministic: the same source always yields the same files.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::sha256_hex;
use crate::domain::{ConversationRecord, RawConversation};
use crate::records::render_records;

/// One in this many conversations goes to validation.
pub const VALIDATION_STRIDE: usize = 11;

pub const VALIDATION_FILE: &str = "validation.jsonl";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Size of an emitted training slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceSize {
    /// The first `n` training conversations (fewer if training is shorter).
    Prefix(usize),
    /// The whole training list.
    All,
}

/// Training slices emitted by [`write_prepared`].
pub const TRAINING_SLICES: [SliceSize; 4] = [
    SliceSize::Prefix(50),
    SliceSize::Prefix(100),
    SliceSize::Prefix(500),
    SliceSize::All,
];

impl SliceSize {
    pub fn file_name(&self) -> String {
        match self {
            SliceSize::Prefix(n) => format!("training_{n}.jsonl"),
            SliceSize::All => "training_all.jsonl".to_string(),
        }
    }

    fn cut<'a>(&self, training: &'a [ConversationRecord]) -> &'a [ConversationRecord] {
        match self {
            SliceSize::Prefix(n) => &training[..training.len().min(*n)],
            SliceSize::All => training,
        }
    }
}

/// Output of [`prepare`].
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDataset {
    pub training_slices: BTreeMap<SliceSize, Vec<ConversationRecord>>,
    pub validation: Vec<ConversationRecord>,
}

impl PreparedDataset {
    /// The full training list, in source order.
    pub fn training(&self) -> &[ConversationRecord] {
        self.training_slices
            .get(&SliceSize::All)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Whether the conversation at zero-based `index` belongs to validation.
pub fn is_validation_index(index: usize) -> bool {
    index % VALIDATION_STRIDE == VALIDATION_STRIDE - 1
}

/// Split source conversations into training slices and a validation set.
pub fn prepare(source: &[RawConversation]) -> PreparedDataset {
    let mut training = Vec::new();
    let mut validation = Vec::new();

    for (index, conversation) in source.iter().enumerate() {
        let record = conversation.to_record();
        if is_validation_index(index) {
            validation.push(record);
        } else {
            training.push(record);
        }
    }

    let training_slices = TRAINING_SLICES
        .iter()
        .map(|size| (*size, size.cut(&training).to_vec()))
        .collect();

    PreparedDataset {
        training_slices,
        validation,
    }
}

// ---------------------------------------------------------------------------
// Emission
// ---------------------------------------------------------------------------

/// One emitted record-stream file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestEntry {
    pub file: String,
    pub records: usize,
    pub sha256: String,
}

/// Description of everything [`write_prepared`] emitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreparedManifest {
    pub generated_at: DateTime<Utc>,
    pub training_records: usize,
    pub validation_records: usize,
    pub files: Vec<ManifestEntry>,
}

/// Write every training slice, the validation set, and `manifest.json` into `out_dir`.
pub fn write_prepared(out_dir: &Path, dataset: &PreparedDataset) -> Result<PreparedManifest> {
    std::fs::create_dir_all(out_dir).with_context(|| format!("create {:?}", out_dir))?;

    let mut files = Vec::new();
    for (size, records) in &dataset.training_slices {
        files.push(write_stream(out_dir, &size.file_name(), records)?);
    }
    files.push(write_stream(out_dir, VALIDATION_FILE, &dataset.validation)?);

    let manifest = PreparedManifest {
        generated_at: Utc::now(),
        training_records: dataset.training().len(),
        validation_records: dataset.validation.len(),
        files,
    };
    let manifest_path = out_dir.join(MANIFEST_FILE);
    let content = serde_json::to_string_pretty(&manifest).context("serialize manifest")?;
    std::fs::write(&manifest_path, content).with_context(|| format!("write {:?}", manifest_path))?;

    Ok(manifest)
}

fn write_stream(out_dir: &Path, name: &str, records: &[ConversationRecord]) -> Result<ManifestEntry> {
    let path = out_dir.join(name);
    let rendered = render_records(records).with_context(|| format!("render {name}"))?;
    std::fs::write(&path, rendered.as_bytes()).with_context(|| format!("write {:?}", path))?;
    Ok(ManifestEntry {
        file: name.to_string(),
        records: records.len(),
        sha256: sha256_hex(rendered.as_bytes()),
    })
}
