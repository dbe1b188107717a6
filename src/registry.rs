//! Per-query name registries.
//!
//! A query owns three of these: column aliases, table aliases and argument
//! placeholders. Names are either *reserved* (blocking future collisions) or
//! *defined* (bound to a value). Only a definition can conflict.

use crate::error::{AliasKind, SqlError, SqlResult};
use std::collections::HashMap;
use tracing::trace;

/// Decides whether two bindings refer to the same underlying object.
pub trait Binding {
    fn same_binding(&self, other: &Self) -> bool;
}

#[derive(Debug, Clone)]
enum Slot<T> {
    Reserved,
    Defined(T),
}

/// Position in a registry's history, taken by [`AliasRegistry::mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryMark {
    added: usize,
    promoted: usize,
}

#[derive(Debug, Clone)]
pub struct AliasRegistry<T> {
    kind: AliasKind,
    order: Vec<String>,
    slots: HashMap<String, Slot<T>>,
    // Reservations later turned into definitions, in promotion order.
    promoted: Vec<String>,
}

impl<T: Binding> AliasRegistry<T> {
    pub fn new(kind: AliasKind) -> Self {
        Self {
            kind,
            order: Vec::new(),
            slots: HashMap::new(),
            promoted: Vec::new(),
        }
    }

    pub fn kind(&self) -> AliasKind {
        self.kind
    }

    /// Reserve a name derived from `base` that is not yet in use.
    ///
    /// `base` itself is used when free, otherwise `base2`, `base3`, ... are
    /// probed in order. `base1` is never produced.
    pub fn reserve_unique(&mut self, base: &str) -> String {
        let name = if self.slots.contains_key(base) {
            (2u64..)
                .map(|n| format!("{}{}", base, n))
                .find(|candidate| !self.slots.contains_key(candidate))
                .unwrap_or_else(|| base.to_string())
        } else {
            base.to_string()
        };
        trace!(kind = %self.kind, %name, "reserved name");
        self.insert_slot(name.clone(), Slot::Reserved);
        name
    }

    /// Bind `name` to `value`.
    ///
    /// Fails when `name` is already defined by a different binding.
    /// Defining over a mere reservation, or re-defining the same binding,
    /// succeeds.
    pub fn define(&mut self, name: &str, value: T) -> SqlResult<()> {
        match self.slots.get(name) {
            Some(Slot::Defined(existing)) if existing.same_binding(&value) => Ok(()),
            Some(Slot::Defined(_)) => Err(SqlError::duplicate(self.kind, name)),
            Some(Slot::Reserved) => {
                self.slots.insert(name.to_string(), Slot::Defined(value));
                self.promoted.push(name.to_string());
                Ok(())
            }
            None => {
                self.insert_slot(name.to_string(), Slot::Defined(value));
                Ok(())
            }
        }
    }

    /// Current position in the registry's history.
    pub fn mark(&self) -> RegistryMark {
        RegistryMark {
            added: self.order.len(),
            promoted: self.promoted.len(),
        }
    }

    /// Undo every reservation and definition made since `mark`.
    pub fn rollback(&mut self, mark: RegistryMark) {
        for name in self.promoted.drain(mark.promoted..) {
            self.slots.insert(name, Slot::Reserved);
        }
        for name in self.order.drain(mark.added..) {
            self.slots.remove(&name);
        }
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        matches!(self.slots.get(name), Some(Slot::Defined(_)))
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        match self.slots.get(name) {
            Some(Slot::Defined(v)) => Some(v),
            _ => None,
        }
    }

    /// Defined entries in first-reservation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> + '_ {
        self.order.iter().filter_map(|name| match self.slots.get(name) {
            Some(Slot::Defined(v)) => Some((name.as_str(), v)),
            _ => None,
        })
    }

    /// Every reserved or defined name, in first-reservation order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn insert_slot(&mut self, name: String, slot: Slot<T>) {
        if self.slots.insert(name.clone(), slot).is_none() {
            self.order.push(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Named(&'static str);

    impl Binding for Named {
        fn same_binding(&self, other: &Self) -> bool {
            self == other
        }
    }

    #[test]
    fn test_rollback_restores_previous_state() {
        let mut reg: AliasRegistry<Named> = AliasRegistry::new(AliasKind::Column);
        reg.define("a", Named("1")).unwrap();
        let reserved = reg.reserve_unique("n");
        let mark = reg.mark();

        reg.define(&reserved, Named("2")).unwrap();
        reg.reserve_unique("a");
        reg.define("b", Named("3")).unwrap();
        reg.rollback(mark);

        assert_eq!(reg.names(), &["a".to_string(), "n".to_string()]);
        assert!(!reg.is_defined("n"));
        assert!(reg.is_reserved("n"));
        assert!(!reg.is_reserved("a2"));
        assert!(!reg.is_reserved("b"));
        assert_eq!(reg.reserve_unique("a"), "a2");
    }

    #[test]
    fn test_reserve_unique_skips_one() {
        let mut reg: AliasRegistry<Named> = AliasRegistry::new(AliasKind::Column);
        let got: Vec<String> = (0..5).map(|_| reg.reserve_unique("col")).collect();
        assert_eq!(got, vec!["col", "col2", "col3", "col4", "col5"]);
        assert!(!reg.is_reserved("col1"));
        assert_eq!(reg.len(), 5);
    }

    #[test]
    fn test_reserve_probes_past_taken_suffix() {
        let mut reg: AliasRegistry<Named> = AliasRegistry::new(AliasKind::Column);
        reg.define("n", Named("a")).unwrap();
        reg.define("n2", Named("b")).unwrap();
        assert_eq!(reg.reserve_unique("n"), "n3");
    }

    #[test]
    fn test_define_over_reservation() {
        let mut reg = AliasRegistry::new(AliasKind::Placeholder);
        let name = reg.reserve_unique(":p");
        assert!(reg.is_reserved(&name));
        assert!(!reg.is_defined(&name));
        assert!(reg.get(&name).is_none());

        reg.define(&name, Named("x")).unwrap();
        assert!(reg.is_defined(&name));
        assert_eq!(reg.get(&name), Some(&Named("x")));
    }

    #[test]
    fn test_duplicate_definition() {
        let mut reg = AliasRegistry::new(AliasKind::Column);
        reg.define("total", Named("a")).unwrap();
        reg.define("total", Named("a")).unwrap();

        let err = reg.define("total", Named("b")).unwrap_err();
        assert!(matches!(
            err,
            SqlError::DuplicateAlias { kind: AliasKind::Column, ref name } if name == "total"
        ));
        assert_eq!(reg.get("total"), Some(&Named("a")));
    }

    #[test]
    fn test_iter_in_order_skips_reserved() {
        let mut reg = AliasRegistry::new(AliasKind::Table);
        reg.define("b", Named("1")).unwrap();
        reg.reserve_unique("r");
        reg.define("a", Named("2")).unwrap();
        let names: Vec<_> = reg.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(reg.names(), &["b".to_string(), "r".to_string(), "a".to_string()]);
    }
}
