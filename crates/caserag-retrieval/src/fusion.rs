//! Reciprocal Rank Fusion over per-query candidate lists.
//!
//! A chunk at zero-based rank `r` in a list contributes `1 / (k0 + r + 1)`.
//! Chunks are identified by id; the first occurrence supplies the chunk
//! returned. Output is sorted by total score, descending, with a stable
//! sort so equal scores keep first-appearance order across the lists.

use std::collections::HashMap;

use caserag_core::types::Chunk;

pub const DEFAULT_RRF_K: f64 = 60.0;

/// A chunk with its accumulated fusion score.
#[derive(Debug, Clone, PartialEq)]
pub struct Fused {
    pub chunk: Chunk,
    pub score: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct RankFuser {
    k0: f64,
}

impl Default for RankFuser {
    fn default() -> Self { Self { k0: DEFAULT_RRF_K } }
}

impl RankFuser {
    pub fn new(k0: f64) -> Self { Self { k0 } }

    pub fn k0(&self) -> f64 { self.k0 }

    pub fn fuse(&self, lists: &[Vec<Chunk>]) -> Vec<Fused> {
        let mut slot_by_id: HashMap<&str, usize> = HashMap::new();
        let mut fused: Vec<Fused> = Vec::new();
        for list in lists {
            for (rank, chunk) in list.iter().enumerate() {
                let contribution = 1.0 / (self.k0 + rank as f64 + 1.0);
                match slot_by_id.get(chunk.id.as_str()) {
                    Some(&slot) => fused[slot].score += contribution,
                    None => {
                        slot_by_id.insert(chunk.id.as_str(), fused.len());
                        fused.push(Fused { chunk: chunk.clone(), score: contribution });
                    }
                }
            }
        }
        // sort_by is stable
        fused.sort_by(|a, b| b.score.total_cmp(&a.score));
        fused
    }
}
