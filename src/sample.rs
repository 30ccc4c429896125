//! Fixed demonstration batch
//!
//! 100 trees in three field blocks (A: 35, B: 35, C: 30) with hard-coded
//! readings, used when no input table is supplied. Nothing here is random, so
//! every run over the demo batch gives the same labels and clusters.

use crate::record::TreeRecord;

const PH_A: [f64; 10] = [6.4, 6.7, 6.2, 6.8, 6.5, 6.9, 6.3, 6.6, 6.1, 6.7];
const MOISTURE_A: [f64; 10] = [35.0, 34.0, 32.0, 36.0, 33.0, 37.0, 31.0, 35.0, 30.0, 34.0];
const BUNCHES_A: [u32; 10] = [21, 20, 19, 22, 20, 23, 18, 21, 19, 22];

const PH_B: [f64; 10] = [6.1, 5.9, 6.3, 5.7, 6.2, 5.8, 6.4, 6.0, 5.6, 6.2];
const MOISTURE_B: [f64; 10] = [31.0, 29.0, 32.0, 28.0, 33.0, 30.0, 34.0, 31.0, 29.0, 32.0];
const BUNCHES_B: [u32; 10] = [16, 15, 18, 14, 17, 16, 19, 15, 14, 17];

const PH_C: [f64; 10] = [5.3, 5.0, 5.5, 4.9, 5.4, 5.1, 5.6, 5.2, 4.8, 5.3];
const MOISTURE_C: [f64; 10] = [26.0, 24.0, 27.0, 23.0, 26.0, 25.0, 28.0, 24.0, 22.0, 27.0];
const BUNCHES_C: [u32; 10] = [11, 9, 12, 8, 11, 10, 13, 9, 8, 12];

pub const BLOCK_SIZES: [(&str, usize); 3] = [("A", 35), ("B", 35), ("C", 30)];

/// Bunch weight (kg) recorded for a bunch count on the demo sheets
pub fn demo_bunch_weight(bunches: u32) -> f64 {
    f64::from(bunches) * 2.0 + 5.0
}

/// The 100-tree demonstration batch, ids "00001" to "00100"
pub fn demo_batch() -> Vec<TreeRecord> {
    let mut records = Vec::with_capacity(100);
    let mut tree_no = 1;

    for (block, size) in BLOCK_SIZES {
        for idx in 0..size {
            let slot = idx % 10;
            let (ph, moisture, bunches, diseased) = match block {
                "A" => (PH_A[slot], MOISTURE_A[slot], BUNCHES_A[slot], false),
                "B" => (PH_B[slot], MOISTURE_B[slot], BUNCHES_B[slot], idx % 5 == 3),
                _ => (PH_C[slot], MOISTURE_C[slot], BUNCHES_C[slot], idx % 3 != 2),
            };

            records.push(TreeRecord {
                tree_id: format!("{:05}", tree_no),
                cluster_label: Some(block.to_string()),
                soil_ph: ph,
                moisture_pct: moisture,
                bunch_count: bunches,
                bunch_weight_kg: demo_bunch_weight(bunches),
                height_cm: None,
                has_disease: diseased,
            });
            tree_no += 1;
        }
    }

    records
}
