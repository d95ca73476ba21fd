use crate::label::{Label, LabelAllocator};
use crate::symbol_table::{Kind, Symbol, SymbolTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

/// Everything code generation needs to know about where it is: the class
/// being compiled, both scopes, and the run's label allocator.
pub struct Context<'l> {
    pub class_name: String,
    class_scope: SymbolTable,
    subroutine_scope: SymbolTable,
    subroutine_kind: Option<SubroutineKind>,
    labels: &'l mut LabelAllocator,
}

impl<'l> Context<'l> {
    pub fn new(labels: &'l mut LabelAllocator) -> Self {
        Self {
            class_name: String::new(),
            class_scope: SymbolTable::new(),
            subroutine_scope: SymbolTable::new(),
            subroutine_kind: None,
            labels,
        }
    }

    pub fn begin_class(&mut self, name: &str) {
        self.class_name = name.to_string();
        self.class_scope.clear();
        self.reset_subroutine_scope();
    }

    pub fn reset_subroutine_scope(&mut self) {
        self.subroutine_scope.clear();
        self.subroutine_kind = None;
    }

    /// Starts a fresh subroutine scope. Methods get their receiver as
    /// argument 0.
    pub fn begin_subroutine(&mut self, kind: SubroutineKind) {
        self.reset_subroutine_scope();
        self.subroutine_kind = Some(kind);
        if kind == SubroutineKind::Method {
            self.subroutine_scope
                .declare("this", &self.class_name, Kind::Argument);
        }
    }

    pub fn subroutine_kind(&self) -> Option<SubroutineKind> {
        self.subroutine_kind
    }

    /// Returns `None` on a duplicate within the target scope.
    pub fn declare(&mut self, name: &str, ty: &str, kind: Kind) -> Option<&Symbol> {
        if kind.is_class_level() {
            self.class_scope.declare(name, ty, kind)
        } else {
            self.subroutine_scope.declare(name, ty, kind)
        }
    }

    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    pub fn count(&self, kind: Kind) -> usize {
        if kind.is_class_level() {
            self.class_scope.count(kind)
        } else {
            self.subroutine_scope.count(kind)
        }
    }

    pub fn class_scope(&self) -> &SymbolTable {
        &self.class_scope
    }

    pub fn subroutine_scope(&self) -> &SymbolTable {
        &self.subroutine_scope
    }

    pub fn next_label(&mut self) -> Label {
        self.labels.next_label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subroutine_scope_shadows_class_scope() {
        let mut labels = LabelAllocator::new();
        let mut context = Context::new(&mut labels);
        context.begin_class("Main");
        context.declare("x", "int", Kind::Field);
        context.begin_subroutine(SubroutineKind::Function);
        assert_eq!(context.resolve("x").unwrap().kind, Kind::Field);

        context.declare("x", "char", Kind::Local);
        let x = context.resolve("x").unwrap();
        assert_eq!(x.kind, Kind::Local);
        assert_eq!(x.ty, "char");
    }

    #[test]
    fn method_scope_starts_with_receiver() {
        let mut labels = LabelAllocator::new();
        let mut context = Context::new(&mut labels);
        context.begin_class("Point");

        context.begin_subroutine(SubroutineKind::Method);
        let symbols = context.subroutine_scope().symbols();
        assert_eq!(symbols.len(), 1);
        assert_eq!(
            symbols[0],
            Symbol {
                name: "this".to_string(),
                ty: "Point".to_string(),
                kind: Kind::Argument,
                index: 0,
            }
        );
        context.declare("dx", "int", Kind::Argument);
        assert_eq!(context.resolve("dx").unwrap().index, 1);

        for kind in [SubroutineKind::Function, SubroutineKind::Constructor].iter() {
            context.begin_subroutine(*kind);
            assert!(context.subroutine_scope().is_empty());
            assert!(context.resolve("this").is_none());
        }
    }

    #[test]
    fn routes_declarations_by_kind() {
        let mut labels = LabelAllocator::new();
        let mut context = Context::new(&mut labels);
        context.begin_class("Main");
        context.declare("s", "int", Kind::Static);
        context.declare("f", "int", Kind::Field);
        context.begin_subroutine(SubroutineKind::Function);
        context.declare("a", "int", Kind::Argument);
        context.declare("l", "int", Kind::Local);
        assert_eq!(context.class_scope().symbols().len(), 2);
        assert_eq!(context.subroutine_scope().symbols().len(), 2);
        assert_eq!(context.count(Kind::Field), 1);
        assert_eq!(context.count(Kind::Local), 1);
    }

    #[test]
    fn labels_continue_across_classes() {
        let mut labels = LabelAllocator::new();
        {
            let mut context = Context::new(&mut labels);
            context.begin_class("A");
            assert_eq!(context.next_label().as_str(), "L1");
            context.begin_class("B");
            assert_eq!(context.next_label().as_str(), "L2");
        }
        assert_eq!(labels.next_label().as_str(), "L3");
    }
}
