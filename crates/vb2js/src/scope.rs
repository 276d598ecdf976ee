use std::collections::HashSet;

/// Name tracking shared by the tokenizer and the statement translators.
///
/// VBA writes both array subscripts and call arguments with parentheses, so
/// the only way to emit `a[i]` instead of `a(i)` is to remember which names
/// were declared as arrays. Names declared inside a Sub/Function go into the
/// local set, which is dropped when the outermost procedure ends; everything
/// else is module-global. `With` targets live here too, because the `.member`
/// expansion happens during name production.
#[derive(Debug, Default)]
pub(crate) struct ScopeState {
    global_names: HashSet<String>,
    local_names: HashSet<String>,
    with_names: Vec<String>,
}

impl ScopeState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_global_name(&mut self, name: &str) {
        self.global_names.insert(name.to_string());
    }

    /// A name already known globally stays global; the sets are kept disjoint.
    pub(crate) fn add_local_name(&mut self, name: &str) {
        if !self.global_names.contains(name) {
            self.local_names.insert(name.to_string());
        }
    }

    pub(crate) fn clear_local_names(&mut self) {
        self.local_names.clear();
    }

    pub(crate) fn is_array_name(&self, name: &str) -> bool {
        self.local_names.contains(name) || self.global_names.contains(name)
    }

    pub(crate) fn push_with(&mut self, name: String) {
        self.with_names.push(name);
    }

    pub(crate) fn pop_with(&mut self) -> Option<String> {
        self.with_names.pop()
    }

    /// The active `With` target, or empty outside any `With` block.
    pub(crate) fn with_prefix(&self) -> &str {
        self.with_names.last().map(String::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_stack_is_lifo() {
        let mut scope = ScopeState::new();
        assert_eq!(scope.with_prefix(), "");
        scope.push_with("a".to_string());
        scope.push_with("b".to_string());
        assert_eq!(scope.with_prefix(), "b");
        assert_eq!(scope.pop_with().as_deref(), Some("b"));
        assert_eq!(scope.with_prefix(), "a");
        assert_eq!(scope.pop_with().as_deref(), Some("a"));
        assert_eq!(scope.pop_with(), None);
    }

    #[test]
    fn array_names_are_the_union_of_both_sets() {
        let mut scope = ScopeState::new();
        scope.add_global_name("g");
        scope.add_local_name("l");
        assert!(scope.is_array_name("g"));
        assert!(scope.is_array_name("l"));
        scope.clear_local_names();
        assert!(scope.is_array_name("g"));
        assert!(!scope.is_array_name("l"));
    }

    #[test]
    fn global_names_never_move_into_the_local_set() {
        let mut scope = ScopeState::new();
        scope.add_global_name("g");
        scope.add_local_name("g");
        scope.clear_local_names();
        assert!(scope.is_array_name("g"));
    }
}
