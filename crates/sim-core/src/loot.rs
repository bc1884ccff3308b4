//! Weighted loot tables. Entries with non-positive percentages are
//! dropped at load; remaining percentages are renormalized to sum to 100
//! when they do not already.

use contracts::LootTableDef;

#[derive(Debug, Clone, PartialEq)]
pub struct LootEntry {
    pub resource_id: String,
    pub drop_percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LootTable {
    pub table_id: String,
    entries: Vec<LootEntry>,
}

impl LootTable {
    pub fn from_def(def: &LootTableDef) -> Self {
        let mut entries: Vec<LootEntry> = def
            .entries
            .iter()
            .filter(|entry| entry.drop_percentage > 0.0)
            .map(|entry| LootEntry {
                resource_id: entry.resource_id.clone(),
                drop_percentage: entry.drop_percentage,
            })
            .collect();

        let total: f64 = entries.iter().map(|entry| entry.drop_percentage).sum();
        if total > 0.0 && (total - 100.0).abs() > 0.01 {
            let factor = 100.0 / total;
            for entry in &mut entries {
                entry.drop_percentage *= factor;
            }
        }

        Self {
            table_id: def.table_id.clone(),
            entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LootEntry] {
        &self.entries
    }

    /// Resolve a roll in [0, 100) against the cumulative distribution.
    /// Falls back to the last entry on accumulated rounding error; `None`
    /// only for an empty table.
    pub fn draw(&self, roll: f64) -> Option<&str> {
        let mut cumulative = 0.0;
        for entry in &self.entries {
            cumulative += entry.drop_percentage;
            if roll <= cumulative {
                return Some(&entry.resource_id);
            }
        }
        self.entries.last().map(|entry| entry.resource_id.as_str())
    }
}
