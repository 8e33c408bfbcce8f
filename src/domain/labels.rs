// ============================================================
// Layer 3 - Gesture Label Map
// ============================================================
// Class ids are row indices into a one-column label file,
// e.g. keypoint_classifier_label.csv:
//
//   A
//   B
//   C
//   ...
//
// The file is parsed here from an in-memory string; reading it
// from disk is the data layer's job.

/// Ordered gesture names, indexed by class id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelMap {
    names: Vec<String>,
}

impl LabelMap {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Parse label file contents. A UTF-8 BOM is stripped, only the
    /// first comma-separated column of each line is used, and blank
    /// lines are skipped.
    pub fn parse(contents: &str) -> Self {
        let contents = contents.strip_prefix('\u{FEFF}').unwrap_or(contents);
        let names = contents
            .lines()
            .map(|line| line.split(',').next().unwrap_or("").trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Gesture name for a class id, falling back to the id itself
    pub fn name(&self, class_id: usize) -> String {
        self.names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| class_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_bom_and_blank_lines() {
        let map = LabelMap::parse("\u{FEFF}A\nB\n\nC\n");
        assert_eq!(map.len(), 3);
        assert_eq!(map.name(0), "A");
        assert_eq!(map.name(2), "C");
    }

    #[test]
    fn test_first_column_only() {
        let map = LabelMap::parse("Open,extra\nClose,more\n");
        assert_eq!(map.name(1), "Close");
    }

    #[test]
    fn test_unknown_id_falls_back_to_number() {
        let map = LabelMap::parse("A\n");
        assert_eq!(map.name(7), "7");
        assert_eq!(LabelMap::default().name(0), "0");
    }
}
