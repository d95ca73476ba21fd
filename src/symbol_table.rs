use fnv::FnvHashMap;

use crate::chunk::Segment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Static,
    Field,
    Argument,
    Local,
}

impl Kind {
    pub fn segment(self) -> Segment {
        match self {
            Kind::Static => Segment::Static,
            Kind::Field => Segment::This,
            Kind::Argument => Segment::Argument,
            Kind::Local => Segment::Local,
        }
    }

    pub fn is_class_level(self) -> bool {
        matches!(self, Kind::Static | Kind::Field)
    }

    fn slot(self) -> usize {
        match self {
            Kind::Static => 0,
            Kind::Field => 1,
            Kind::Argument => 2,
            Kind::Local => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub ty: String,
    pub kind: Kind,
    pub index: usize,
}

/// One scope's declarations. Indices are handed out per kind, starting at
/// zero, in declaration order.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    by_name: FnvHashMap<String, usize>,
    counts: [usize; 4],
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` if `name` is already declared in this table.
    pub fn declare(&mut self, name: &str, ty: &str, kind: Kind) -> Option<&Symbol> {
        if self.by_name.contains_key(name) {
            return None;
        }
        let index = self.counts[kind.slot()];
        self.counts[kind.slot()] += 1;
        self.by_name.insert(name.to_string(), self.symbols.len());
        self.symbols.push(Symbol {
            name: name.to_string(),
            ty: ty.to_string(),
            kind,
            index,
        });
        self.symbols.last()
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.by_name.get(name).map(|&i| &self.symbols[i])
    }

    pub fn count(&self, kind: Kind) -> usize {
        self.counts[kind.slot()]
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
        self.by_name.clear();
        self.counts = [0; 4];
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense_per_kind() {
        let mut table = SymbolTable::new();
        table.declare("a", "int", Kind::Field);
        table.declare("s", "int", Kind::Static);
        table.declare("b", "Point", Kind::Field);
        table.declare("c", "boolean", Kind::Field);
        table.declare("t", "char", Kind::Static);

        for kind in [Kind::Static, Kind::Field].iter() {
            let indices: Vec<_> = table
                .symbols()
                .iter()
                .filter(|s| s.kind == *kind)
                .map(|s| s.index)
                .collect();
            let expected: Vec<_> = (0..table.count(*kind)).collect();
            assert_eq!(indices, expected);
        }
        assert_eq!(table.count(Kind::Field), 3);
        assert_eq!(table.get("b").unwrap().index, 1);
        assert_eq!(table.get("b").unwrap().ty, "Point");
        assert_eq!(table.get("t").unwrap().index, 1);
    }

    #[test]
    fn rejects_redeclaration() {
        let mut table = SymbolTable::new();
        assert!(table.declare("x", "int", Kind::Local).is_some());
        assert!(table.declare("x", "char", Kind::Argument).is_none());
        assert_eq!(table.count(Kind::Argument), 0);
        assert_eq!(table.get("x").unwrap().ty, "int");
    }

    #[test]
    fn clear_restarts_numbering() {
        let mut table = SymbolTable::new();
        table.declare("x", "int", Kind::Local);
        table.declare("y", "int", Kind::Local);
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.count(Kind::Local), 0);
        assert!(table.get("x").is_none());
        assert_eq!(table.declare("z", "int", Kind::Local).unwrap().index, 0);
    }

    #[test]
    fn kinds_map_to_segments() {
        assert_eq!(Kind::Static.segment(), Segment::Static);
        assert_eq!(Kind::Field.segment(), Segment::This);
        assert_eq!(Kind::Argument.segment(), Segment::Argument);
        assert_eq!(Kind::Local.segment(), Segment::Local);
    }
}
