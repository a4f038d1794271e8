//! Sample alignment across phenotype tables.
//!
//! Tables are joined on (FID, IID) as an outer join: every sample seen in
//! any table gets a row, and tables lacking it contribute NaN.

use std::collections::HashMap;

/// (FID, IID).
pub type SampleKey = (String, String);

/// Result of aligning sample keys from multiple sources.
#[derive(Debug, Clone)]
pub struct SampleUnion {
    /// Every key, in order of first appearance across sources.
    pub keys: Vec<SampleKey>,
    /// `indices[s][i]` = row of `keys[i]` in source `s`, if present.
    pub indices: Vec<Vec<Option<usize>>>,
}

/// Outer-join sample keys from several sources.
///
/// Within a source, the first occurrence of a duplicated key wins.
pub fn union_samples(sources: &[&[SampleKey]]) -> SampleUnion {
    let mut position: HashMap<&SampleKey, usize> = HashMap::new();
    let mut keys: Vec<SampleKey> = Vec::new();
    for src in sources {
        for key in src.iter() {
            if !position.contains_key(key) {
                position.insert(key, keys.len());
                keys.push(key.clone());
            }
        }
    }

    let indices = sources
        .iter()
        .map(|src| {
            let mut col = vec![None; keys.len()];
            for (row, key) in src.iter().enumerate() {
                let slot = &mut col[position[key]];
                if slot.is_none() {
                    *slot = Some(row);
                }
            }
            col
        })
        .collect();

    SampleUnion { keys, indices }
}

/// Reorder f64 data by an alignment, filling gaps with NaN.
pub fn gather_f64(data: &[f64], indices: &[Option<usize>]) -> Vec<f64> {
    indices
        .iter()
        .map(|i| i.map_or(f64::NAN, |i| data[i]))
        .collect()
}
